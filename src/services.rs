use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::validation::FieldErrors;
use crate::repositories::{referrals::InMemoryReferralStore, uploads::UploadRepository};
use crate::settings::Settings;

pub mod http;
pub mod referrals;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(FieldErrors),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidId(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Repository error: {0} - {1}")]
    Repository(String, String),
    #[error("Communication error: {0} - {1}")]
    Communication(String, String),
    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    /// Drains the channel, finishing each request before reading the next.
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            handler.handle_request(request).await;
        }
    }
}

pub async fn start_services(settings: Settings) -> Result<(), anyhow::Error> {
    let (referral_tx, mut referral_rx) = mpsc::channel(settings.http.channel_capacity);

    let mut referral_service = referrals::ReferralService::new();
    let store = Arc::new(InMemoryReferralStore::new());

    log::info!("Starting referral service.");
    tokio::spawn(async move {
        referral_service
            .run(
                referrals::ReferralRequestHandler::new(store),
                &mut referral_rx,
            )
            .await;
    });

    let uploads = UploadRepository::new(&settings.uploads.dir)?;
    log::info!("Serving uploads from {}.", uploads.dir().display());

    log::info!("Starting HTTP server.");
    let state = http::AppState::new(referral_tx, uploads, settings.max_upload_bytes());
    http::start_http_server(&settings.http.listen, state).await
}
