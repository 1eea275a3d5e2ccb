use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

use crate::models::referrals::{Referral, ReferralWithId};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// A success response whose body is not the expected JSON.
    #[error("Could not decode response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Remote side of the referral cache.
#[async_trait]
pub trait ReferralApi: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<ReferralWithId>, ClientError>;

    async fn create(&self, referral: &Referral) -> Result<ReferralWithId, ClientError>;

    async fn update(&self, id: i64, referral: &Referral) -> Result<(), ClientError>;

    async fn delete(&self, id: i64) -> Result<(), ClientError>;
}

#[derive(Clone)]
pub struct HttpReferralApi {
    base_url: String,
    http: Client,
}

impl HttpReferralApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn referrals_url(&self) -> String {
        format!("{}/api/referrals", self.base_url)
    }

    fn referral_url(&self, id: i64) -> String {
        format!("{}/api/referrals/{}", self.base_url, id)
    }
}

#[async_trait]
impl ReferralApi for HttpReferralApi {
    async fn fetch_all(&self) -> Result<Vec<ReferralWithId>, ClientError> {
        let response = self.http.get(self.referrals_url()).send().await?;

        check(response).await?.json().await.map_err(ClientError::Decode)
    }

    async fn create(&self, referral: &Referral) -> Result<ReferralWithId, ClientError> {
        let response = self
            .http
            .post(self.referrals_url())
            .json(referral)
            .send()
            .await?;

        check(response).await?.json().await.map_err(ClientError::Decode)
    }

    async fn update(&self, id: i64, referral: &Referral) -> Result<(), ClientError> {
        let response = self
            .http
            .put(self.referral_url(id))
            .json(referral)
            .send()
            .await?;
        check(response).await?;

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let response = self.http.delete(self.referral_url(id)).send().await?;
        check(response).await?;

        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value.get("error").map(describe_error))
        .unwrap_or_else(|| format!("Request failed with status {status}"));

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Flattens an `error` body into display text. Field maps become one
/// `field: message` line per message.
pub fn describe_error(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) => fields
            .iter()
            .flat_map(|(field, messages)| match messages {
                Value::Array(messages) => messages
                    .iter()
                    .map(|message| format!("{field}: {}", text(message)))
                    .collect::<Vec<_>>(),
                other => vec![format!("{field}: {}", text(other))],
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

fn text(value: &Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}
