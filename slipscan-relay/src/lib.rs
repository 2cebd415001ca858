//! slipscan-relay library
//!
//! Stateless relay between SlipScan clients and the extraction backend.
//! Exposes the router for the binary and for integration tests.

pub mod api;
pub mod backend;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use slipscan_common::config::RelayConfig;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::backend::{BackendClient, BackendError};

/// Application state shared across handlers
///
/// Built once at startup from the resolved configuration; handlers never read
/// the environment.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    /// `None` when no backend URL is configured
    pub backend: Option<BackendClient>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self, BackendError> {
        let backend = match config.backend_url.as_deref() {
            Some(url) => Some(BackendClient::new(url, config.request_timeout)?),
            None => None,
        };

        Ok(Self {
            config: Arc::new(config),
            backend,
        })
    }

    /// Backend client, or 503 when unconfigured
    pub fn backend(&self) -> ApiResult<&BackendClient> {
        self.backend.as_ref().ok_or(ApiError::NotConfigured)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::post;

    let relay = Router::new()
        .route("/api/extract", post(api::extract_single))
        .route("/api/extract-multi", post(api::extract_multi))
        .route("/api/export", post(api::export_results))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    Router::new()
        .merge(relay)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
