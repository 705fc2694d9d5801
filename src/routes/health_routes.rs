use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}

/// Comprueba que el almacén responde
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "storage": state.config.storage_backend.as_str(),
                "timestamp": timestamp,
            })),
        ),
        Err(e) => {
            warn!("⚠️ Health check fallido: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "storage": state.config.storage_backend.as_str(),
                    "timestamp": timestamp,
                })),
            )
        }
    }
}
