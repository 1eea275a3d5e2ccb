use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;

use super::{referrals::ReferralRequest, ServiceError};
use crate::repositories::uploads::UploadRepository;

mod referrals;
mod uploads;

const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Clone)]
pub struct AppState {
    referral_channel: mpsc::Sender<ReferralRequest>,
    uploads: Arc<UploadRepository>,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        referral_channel: mpsc::Sender<ReferralRequest>,
        uploads: UploadRepository,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            referral_channel,
            uploads: Arc::new(uploads),
            max_upload_bytes,
        }
    }

    /// Sends a request to the referral service and waits for its reply.
    async fn dispatch<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, ServiceError>>) -> ReferralRequest,
    ) -> Result<T, ServiceError> {
        let (response_tx, response_rx) = oneshot::channel();

        self.referral_channel
            .send(build(response_tx))
            .await
            .map_err(|e| ServiceError::Communication("HTTP => Referral".to_string(), e.to_string()))?;

        response_rx.await.map_err(|e| {
            ServiceError::Communication("Referral => HTTP".to_string(), e.to_string())
        })?
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::Validation(errors) => {
                log::warn!("Rejected referral: {errors}");
                (StatusCode::BAD_REQUEST, Json(json!({ "error": errors }))).into_response()
            }
            ServiceError::Conflict(message) | ServiceError::InvalidId(message) => {
                log::warn!("Rejected referral request: {message}");
                error_response(StatusCode::BAD_REQUEST, &message)
            }
            ServiceError::NotFound(message) => error_response(StatusCode::NOT_FOUND, &message),
            ServiceError::Repository(..)
            | ServiceError::Communication(..)
            | ServiceError::Internal(..) => {
                log::error!("{self}");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
            }
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route(
            "/api/referrals",
            get(referrals::fetch_referrals).post(referrals::create_referral),
        )
        .route(
            "/api/referrals/{id}",
            put(referrals::update_referral).delete(referrals::destroy_referral),
        )
        .route("/api/file/upload", post(uploads::upload_file))
        .route("/uploads/{filename}", get(uploads::get_file))
        .route("/health", get(|| async { "OK" }))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_http_server(listen: &str, state: AppState) -> Result<(), anyhow::Error> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
