use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::referrals::ReferralWithId;
use crate::models::validation::validate_referral;
use crate::repositories::referrals::ReferralStore;

pub const EMAIL_TAKEN: &str = "Email already exists!";
pub const EMAIL_TAKEN_ON_UPDATE: &str = "Unable to update, email already exists!";
pub const INVALID_ID: &str = "Invalid referral ID";
pub const NOT_FOUND: &str = "Referral not found";
pub const DELETED: &str = "Referral deleted successfully";

pub enum ReferralRequest {
    Create {
        input: Value,
        response: oneshot::Sender<Result<ReferralWithId, ServiceError>>,
    },
    Fetch {
        response: oneshot::Sender<Result<Vec<ReferralWithId>, ServiceError>>,
    },
    Update {
        id: String,
        input: Value,
        response: oneshot::Sender<Result<ReferralWithId, ServiceError>>,
    },
    Destroy {
        id: String,
        response: oneshot::Sender<Result<String, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct ReferralRequestHandler {
    store: Arc<dyn ReferralStore>,
}

impl ReferralRequestHandler {
    pub fn new(store: Arc<dyn ReferralStore>) -> Self {
        ReferralRequestHandler { store }
    }

    pub async fn create(&self, input: &Value) -> Result<ReferralWithId, ServiceError> {
        let referral = validate_referral(input).map_err(ServiceError::Validation)?;

        let taken = self
            .store
            .find_by_email(&referral.email)
            .await
            .map_err(repository_error)?;
        if taken.is_some() {
            return Err(ServiceError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let id = self.store.next_id().await.map_err(repository_error)?;
        let record = self
            .store
            .insert(ReferralWithId::new(id, referral))
            .await
            .map_err(repository_error)?;

        log::info!("Created referral {}.", record.id);
        Ok(record)
    }

    pub async fn fetch(&self) -> Result<Vec<ReferralWithId>, ServiceError> {
        self.store.list().await.map_err(repository_error)
    }

    pub async fn update(&self, id: &str, input: &Value) -> Result<ReferralWithId, ServiceError> {
        let id = parse_id(id)?;
        let changes = validate_referral(input).map_err(ServiceError::Validation)?;

        let mut record = self
            .store
            .find(id)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))?;

        let owner = self
            .store
            .find_by_email(&changes.email)
            .await
            .map_err(repository_error)?;
        if owner.is_some_and(|owner| owner.id != id) {
            return Err(ServiceError::Conflict(EMAIL_TAKEN_ON_UPDATE.to_string()));
        }

        record.referral.merge(changes);
        let record = self
            .store
            .update(record)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))?;

        log::info!("Updated referral {}.", record.id);
        Ok(record)
    }

    pub async fn destroy(&self, id: &str) -> Result<String, ServiceError> {
        let id = parse_id(id)?;

        self.store
            .delete(id)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))?;

        log::info!("Deleted referral {id}.");
        Ok(DELETED.to_string())
    }
}

fn parse_id(id: &str) -> Result<i64, ServiceError> {
    id.trim()
        .parse()
        .map_err(|_| ServiceError::InvalidId(INVALID_ID.to_string()))
}

fn repository_error(e: anyhow::Error) -> ServiceError {
    ServiceError::Repository("Referrals".to_string(), e.to_string())
}

#[async_trait]
impl RequestHandler<ReferralRequest> for ReferralRequestHandler {
    async fn handle_request(&self, request: ReferralRequest) {
        match request {
            ReferralRequest::Create { input, response } => {
                let result = self.create(&input).await;
                let _ = response.send(result);
            }
            ReferralRequest::Fetch { response } => {
                let result = self.fetch().await;
                let _ = response.send(result);
            }
            ReferralRequest::Update {
                id,
                input,
                response,
            } => {
                let result = self.update(&id, &input).await;
                let _ = response.send(result);
            }
            ReferralRequest::Destroy { id, response } => {
                let result = self.destroy(&id).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct ReferralService;

impl ReferralService {
    pub fn new() -> Self {
        ReferralService {}
    }
}

impl Default for ReferralService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Service<ReferralRequest, ReferralRequestHandler> for ReferralService {}
