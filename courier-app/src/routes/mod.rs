pub mod health;
pub mod send;
pub mod webhook;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

pub fn router() -> Router {
    Router::new()
        .merge(health::router())
        .merge(send::router())
        .merge(webhook::router())
}

/// HTTP-surface error taxonomy: validation -> 400, transport unavailable ->
/// 503, transport send failure -> 500.
#[derive(Debug)]
pub enum ApiError {
    Validation { error: String, message: String },
    Unavailable { error: String, message: String },
    SendFailed { error: String, message: String },
}

impl ApiError {
    pub fn validation(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn send_failed(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SendFailed {
            error: error.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Validation { error, message } => (StatusCode::BAD_REQUEST, error, message),
            ApiError::Unavailable { error, message } => {
                (StatusCode::SERVICE_UNAVAILABLE, error, message)
            }
            ApiError::SendFailed { error, message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, error, message)
            }
        };
        (
            status,
            Json(serde_json::json!({
                "success": false,
                "error": error,
                "message": message,
                "timestamp": Utc::now(),
            })),
        )
            .into_response()
    }
}
