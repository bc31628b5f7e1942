use crate::routes::ApiError;
use crate::server::AppState;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Extension, Json};
use courier_channels::InboundEvent;
use std::sync::Arc;

pub fn router() -> axum::Router {
    axum::Router::new().route("/webhook/event", post(receive_event))
}

/// Inbound delivery from the socket-gateway sidecar. Events are queued for
/// the gateway loop; processing happens asynchronously.
#[tracing::instrument(level = "debug", skip_all)]
async fn receive_event(
    Extension(state): Extension<Arc<AppState>>,
    Json(event): Json<InboundEvent>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    tracing::debug!(
        sender_id = %event.sender_id,
        delivery = ?event.delivery,
        from_me = event.from_me,
        "inbound event received"
    );
    state.inbound_tx.send(event).await.map_err(|_| {
        ApiError::unavailable("inbound queue closed", "the bridge is shutting down")
    })?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "accepted": true })),
    ))
}
