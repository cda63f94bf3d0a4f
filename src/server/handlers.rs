//! Route handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use super::{ApiError, AppState};
use crate::domain::{MessageId, SendSms, SendSmsInput};
use crate::normalizer::{self, NormalizationResult};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// `GET /health`
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "sms-gateway",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /sms/send`: send to the recipients that normalize, with retry.
///
/// A request may override `max_retries` up to the state's cap.
pub async fn send_sms(
    State(state): State<AppState>,
    payload: Result<Json<SendSmsInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    if input.phone_numbers.is_empty() {
        return Err(ApiError::BadRequest(
            "phone_numbers must be a non-empty list".to_owned(),
        ));
    }

    if input.max_retries.is_some_and(|n| n > state.max_retries_cap) {
        return Err(ApiError::BadRequest(format!(
            "max_retries must not exceed {}",
            state.max_retries_cap
        )));
    }

    let (message, options) = input.split()?;
    let NormalizationResult { accepted, rejected } = state.normalizer.format(&input.phone_numbers);
    log_rejected(&rejected);
    if accepted.is_empty() {
        return Err(ApiError::BadRequest(
            "No valid phone numbers provided".to_owned(),
        ));
    }

    let request = SendSms::new(accepted, message, options)?;
    let response = state.dispatcher.send_sms(request).await?;
    info!(attempts = response.attempts, "SMS sent via API");

    Ok(Json(json!({
        "success": true,
        "message": "SMS sent successfully",
        "data": response.payload,
        "message_id": response.message_id,
        "attempts": response.attempts,
        "rejected_numbers": rejected,
    })))
}

/// `GET /sms/status/{message_id}`, passed through from the provider.
pub async fn sms_status(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let message_id = MessageId::new(message_id)?;
    let response = state.dispatcher.status(&message_id).await?;
    Ok(Json(json!({ "success": true, "data": response.payload })))
}

/// `GET /account/balance`, passed through from the provider.
pub async fn balance(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let response = state.dispatcher.balance().await?;
    Ok(Json(json!({ "success": true, "data": response.payload })))
}

#[derive(Debug, Deserialize)]
pub struct ValidateInput {
    pub phone_numbers: Vec<String>,
}

/// Report both the raw syntactic check and the normalized outcome for each number.
pub async fn validate_numbers(
    State(state): State<AppState>,
    payload: Result<Json<ValidateInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;

    let validation_results: Map<String, Value> = state
        .normalizer
        .validate_many(input.phone_numbers.iter().map(String::as_str))
        .into_iter()
        .map(|(number, valid)| (number.to_owned(), Value::Bool(valid)))
        .collect();
    let NormalizationResult { accepted, rejected } = state.normalizer.format(&input.phone_numbers);

    Ok(Json(json!({
        "success": true,
        "validation_results": validation_results,
        "formatted_numbers": accepted,
        "rejected_numbers": rejected,
    })))
}

/// Delivery-report webhook. Always acknowledges with 204 so the provider does not redeliver.
pub async fn delivery_report(body: Bytes) -> StatusCode {
    match serde_json::from_slice::<Value>(&body) {
        Ok(report) => {
            let field = |name: &str| report.get(name).cloned().unwrap_or(Value::Null);
            info!(
                message_id = %field("message_id"),
                status = %field("status"),
                to = %field("to"),
                "delivery report received"
            );
        }
        Err(err) => {
            warn!(error = %err, bytes = body.len(), "unreadable delivery report");
        }
    }
    StatusCode::NO_CONTENT
}

/// JSON 404 for every unmatched route.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint not found" })),
    )
}

fn log_rejected(rejected: &[String]) {
    if rejected.is_empty() {
        return;
    }
    let masked: Vec<String> = rejected.iter().map(|n| normalizer::mask(n)).collect();
    warn!(count = rejected.len(), rejected = ?masked, "dropping invalid phone numbers");
}
