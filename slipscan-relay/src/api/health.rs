//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// False when no backend URL is set; relay calls then answer 503
    pub backend_configured: bool,
}

/// GET /health
///
/// Reports local state only; never contacts the backend.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "slipscan-relay".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend_configured: state.config.backend_configured(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
