use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::dispatcher::DispatchError;
use crate::domain::ValidationError;

#[derive(Debug, thiserror::Error)]
/// Error returned by a handler, rendered as `{"error": "..."}`.
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Dispatch(err) => match err {
                DispatchError::Configuration(_) | DispatchError::Validation(_) => {
                    StatusCode::BAD_REQUEST
                }
                DispatchError::PermanentTransport { .. } | DispatchError::Parse(_) => {
                    StatusCode::BAD_GATEWAY
                }
                DispatchError::TransientTransport { .. } => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Dispatch(DispatchError::Validation(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
