use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use super::AppState;
use crate::services::{referrals::ReferralRequest, ServiceError};

const INVALID_REQUEST: &str = "Invalid request";

pub async fn create_referral(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => return Ok(invalid_request(rejection)),
    };

    let referral = state
        .dispatch(|response| ReferralRequest::Create { input, response })
        .await?;

    Ok((StatusCode::CREATED, Json(referral)).into_response())
}

pub async fn fetch_referrals(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let referrals = state
        .dispatch(|response| ReferralRequest::Fetch { response })
        .await?;

    Ok((StatusCode::OK, Json(referrals)).into_response())
}

/// Answers `201` with a `null` body; clients already hold the submitted fields.
pub async fn update_referral(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => return Ok(invalid_request(rejection)),
    };

    state
        .dispatch(|response| ReferralRequest::Update {
            id,
            input,
            response,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(Value::Null)).into_response())
}

pub async fn destroy_referral(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let message = state
        .dispatch(|response| ReferralRequest::Destroy { id, response })
        .await?;

    Ok((StatusCode::OK, Json(json!({ "message": message }))).into_response())
}

fn invalid_request(rejection: JsonRejection) -> Response {
    log::warn!("Malformed referral payload: {}", rejection.body_text());
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": INVALID_REQUEST })),
    )
        .into_response()
}
