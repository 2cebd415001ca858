//! Extraction relays
//!
//! `POST /api/extract` (one image) and `POST /api/extract-multi` (2..=10
//! images). The backend's JSON is returned as-is; result order and content
//! are not touched.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::Value;
use tracing::info;

use super::forms::{BatchUpload, SingleUpload};
use crate::error::ApiResult;
use crate::AppState;

/// POST /api/extract
pub async fn extract_single(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Value>> {
    let backend = state.backend()?;
    let upload = SingleUpload::read(multipart).await?;

    info!(
        filename = upload.file.filename(),
        bytes = upload.file.len(),
        "Relaying single-image extraction"
    );

    let body = backend.extract(&upload.file).await?;
    Ok(Json(body))
}

/// POST /api/extract-multi
pub async fn extract_multi(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Value>> {
    let backend = state.backend()?;
    let upload = BatchUpload::read(multipart).await?;

    info!(
        files = upload.batch.len(),
        bytes = upload.batch.total_bytes(),
        "Relaying multi-image extraction"
    );

    let body = backend.extract_multi(&upload.batch).await?;
    Ok(Json(body))
}
