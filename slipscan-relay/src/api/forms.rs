//! Typed multipart request bodies
//!
//! Each relay endpoint reads its multipart body exactly once, here, into a
//! typed form. Handlers receive either a valid form or a 400/413 error and
//! never inspect raw fields themselves.

use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::Multipart;
use axum::http::StatusCode;
use slipscan_common::{ImagePayload, UploadBatch, MAX_BATCH_FILES};

use crate::error::{ApiError, ApiResult};

/// Body of `POST /api/extract`
#[derive(Debug)]
pub struct SingleUpload {
    pub file: ImagePayload,
}

/// Body of `POST /api/extract-multi`
#[derive(Debug)]
pub struct BatchUpload {
    pub batch: UploadBatch,
}

/// Body of `POST /api/export`
#[derive(Debug)]
pub struct ExportForm {
    /// Exactly the text received; forwarded without re-serializing
    pub extracted_results: String,
}

impl SingleUpload {
    pub async fn read(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<Self> {
        let mut multipart = multipart.map_err(rejection)?;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some("file") {
                continue;
            }
            let file = read_image(field, "file").await?;
            return Ok(Self { file });
        }

        Err(ApiError::BadRequest(
            "Invalid or missing file: field 'file' is required".to_string(),
        ))
    }
}

impl BatchUpload {
    pub async fn read(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<Self> {
        let mut multipart = multipart.map_err(rejection)?;
        let mut files = Vec::new();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some("files") {
                continue;
            }
            // Stop before buffering an eleventh file
            if files.len() == MAX_BATCH_FILES {
                return Err(ApiError::BadRequest(format!(
                    "Maximum {} files allowed",
                    MAX_BATCH_FILES
                )));
            }
            files.push(read_image(field, "files").await?);
        }

        if files.is_empty() {
            return Err(ApiError::BadRequest(
                "Invalid or missing files: field 'files' is required".to_string(),
            ));
        }

        Ok(Self {
            batch: UploadBatch::new(files)?,
        })
    }
}

impl ExportForm {
    pub async fn read(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<Self> {
        let mut multipart = multipart.map_err(rejection)?;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some("extracted_results") {
                continue;
            }
            if field.file_name().is_some() {
                return Err(ApiError::BadRequest(
                    "Field 'extracted_results' must be a text field, not a file".to_string(),
                ));
            }

            let text = field.text().await.map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    multipart_error(e)
                } else {
                    ApiError::BadRequest(
                        "Invalid format: 'extracted_results' is not valid UTF-8 text".to_string(),
                    )
                }
            })?;

            if text.trim().is_empty() {
                break;
            }

            serde_json::from_str::<serde_json::Value>(&text).map_err(|e| {
                ApiError::BadRequest(format!(
                    "Invalid format: 'extracted_results' is not valid JSON ({})",
                    e
                ))
            })?;

            return Ok(Self {
                extracted_results: text,
            });
        }

        Err(ApiError::BadRequest(
            "No results provided: field 'extracted_results' is required".to_string(),
        ))
    }
}

/// Read a file-typed field into a validated image
async fn read_image(field: Field<'_>, field_name: &str) -> ApiResult<ImagePayload> {
    let Some(filename) = field.file_name().map(str::to_string) else {
        return Err(ApiError::BadRequest(format!(
            "Field '{}' must be a file",
            field_name
        )));
    };
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(multipart_error)?;

    Ok(ImagePayload::new(filename, content_type.as_deref(), bytes)?)
}

fn rejection(err: MultipartRejection) -> ApiError {
    ApiError::BadRequest(format!("Expected a multipart/form-data body: {}", err.body_text()))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(format!("Upload too large: {}", err.body_text()))
    } else {
        ApiError::BadRequest(format!("Malformed multipart body: {}", err.body_text()))
    }
}
