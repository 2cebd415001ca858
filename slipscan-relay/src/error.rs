//! Error types for slipscan-relay
//!
//! Every failure leaving a relay handler renders as `{ "error": "..." }`.
//! The status code tells the caller which side failed:
//! 400/413 for the request itself, the backend's own status when it rejected
//! the input, 502 when the backend could not be reached or answered garbage,
//! 503 when no backend is configured.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::backend::BackendError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Upload exceeds the configured body limit (413)
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Backend answered with a non-success status; status is passed through
    #[error("Backend error: {message}")]
    Backend { status: u16, message: String },

    /// Backend could not be reached (502)
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// Backend answered success with an unusable body (502)
    #[error("Invalid response from backend: {0}")]
    InvalidUpstream(String),

    /// No backend URL configured (503)
    #[error("Extraction backend is not configured")]
    NotConfigured,

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Backend { status, .. } => backend_status(*status),
            ApiError::Unreachable(_) | ApiError::InvalidUpstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Backend status as seen by the caller
///
/// Only 4xx/5xx codes are passed through; anything else reaching the error
/// path is reported as 502.
fn backend_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Transport(msg) => ApiError::Unreachable(msg),
            BackendError::Status { status, body } => {
                let message = if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body
                };
                ApiError::Backend { status, message }
            }
            BackendError::Decode(msg) => ApiError::InvalidUpstream(msg),
            BackendError::Setup(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<slipscan_common::Error> for ApiError {
    fn from(err: slipscan_common::Error) -> Self {
        match err {
            slipscan_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", message);
        } else {
            warn!(status = status.as_u16(), "{}", message);
        }

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
