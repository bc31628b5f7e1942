use crate::server::AppState;
use axum::routing::get;
use axum::{Extension, Json};
use chrono::Utc;
use std::sync::Arc;

pub fn router() -> axum::Router {
    axum::Router::new().route("/health", get(get_health))
}

#[tracing::instrument(level = "debug", skip_all)]
async fn get_health(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    let transport_connected = state.transport.is_connected().await;
    Json(serde_json::json!({
        "status": "ok",
        "transport_connected": transport_connected,
        "timestamp": Utc::now(),
    }))
}
