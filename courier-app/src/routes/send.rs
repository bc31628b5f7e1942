use crate::routes::ApiError;
use crate::server::AppState;
use axum::routing::post;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct SendRequest {
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub fn router() -> axum::Router {
    axum::Router::new().route("/send-message", post(send_message))
}

#[tracing::instrument(level = "info", skip_all)]
async fn send_message(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<SendRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.transport.is_connected().await {
        return Err(ApiError::unavailable(
            "transport is not connected",
            "wait for the messaging session to be established",
        ));
    }

    let to = req
        .to
        .as_deref()
        .map(str::trim)
        .filter(|to| !to.is_empty())
        .ok_or_else(|| {
            ApiError::validation("field \"to\" is required", "provide the recipient's phone number or chat address")
        })?;
    let message = req
        .message
        .as_deref()
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .ok_or_else(|| {
            ApiError::validation("field \"message\" is required", "provide the message to send")
        })?;

    let recipient = normalize_recipient(to, &state.default_country_code, &state.address_suffix)?;

    tracing::info!(recipient = %recipient, "sending message via transport");
    let receipt = state
        .transport
        .send_text(&recipient, message)
        .await
        .map_err(|e| ApiError::send_failed("message send failed", e.to_string()))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": {
            "messageId": receipt.message_id,
            "to": recipient,
            "message": message,
            "timestamp": receipt.sent_at.timestamp_millis(),
            "sentAt": receipt.sent_at,
        },
        "timestamp": Utc::now(),
    })))
}

/// Chat addresses (anything containing `@`) pass through untouched. Bare
/// phone numbers are stripped to digits, must carry at least 10 of them,
/// gain the default country code when absent, and become an individual
/// address under the configured suffix.
fn normalize_recipient(
    raw: &str,
    default_country_code: &str,
    address_suffix: &str,
) -> Result<String, ApiError> {
    if raw.contains('@') {
        return Ok(raw.to_string());
    }
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 10 {
        return Err(ApiError::validation(
            "invalid phone number",
            "the number must have at least 10 digits",
        ));
    }
    let full = if digits.starts_with(default_country_code) {
        digits
    } else {
        format!("{default_country_code}{digits}")
    };
    Ok(format!("{full}@{address_suffix}"))
}
