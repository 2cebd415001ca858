//! Export relay: `POST /api/export`

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use slipscan_common::models::{EXPORT_CONTENT_DISPOSITION, XLSX_MIME_TYPE};
use tracing::info;

use super::forms::ExportForm;
use crate::error::ApiResult;
use crate::AppState;

/// POST /api/export
///
/// Forwards the `extracted_results` text unchanged and streams the
/// spreadsheet back byte-for-byte under a fixed type and download name.
pub async fn export_results(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Response> {
    let backend = state.backend()?;
    let form = ExportForm::read(multipart).await?;

    info!(chars = form.extracted_results.len(), "Relaying export");

    let spreadsheet = backend.export(form.extracted_results).await?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME_TYPE),
            (header::CONTENT_DISPOSITION, EXPORT_CONTENT_DISPOSITION),
        ],
        spreadsheet,
    )
        .into_response())
}
