//! Extraction backend client
//!
//! Repackages validated uploads as multipart forms and posts them to the
//! configured backend. One call in, one call out: no retries, no fan-out.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use slipscan_common::{ExtractRoute, ImagePayload, UploadBatch};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("slipscan-relay/", env!("CARGO_PKG_VERSION"));

/// Backend client errors
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never completed (connect, DNS, timeout, reset)
    #[error("{0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Success status but the body could not be read or decoded
    #[error("{0}")]
    Decode(String),

    /// Request could not be built
    #[error("{0}")]
    Setup(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "request timed out"
        } else if err.is_connect() {
            "connection failed"
        } else {
            "request failed"
        };
        BackendError::Transport(format!("{}: {}", kind, err))
    }
}

/// HTTP client bound to one backend base URL
#[derive(Debug, Clone)]
pub struct BackendClient {
    http_client: reqwest::Client,
    base_url: reqwest::Url,
}

impl BackendClient {
    /// `base_url` is expected without trailing slash (see config normalization)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| BackendError::Setup(format!("invalid backend URL '{}': {}", base_url, e)))?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Setup(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// `{base}/extract` with a single `file` part
    pub async fn extract(&self, file: &ImagePayload) -> Result<Value, BackendError> {
        let form = Form::new().part(ExtractRoute::Single.field_name(), image_part(file, 0)?);
        let response = self.post_form(ExtractRoute::Single.backend_path(), form).await?;
        decode_json(response).await
    }

    /// `{base}/extract_multi` with one `files` part per image, in batch order
    pub async fn extract_multi(&self, batch: &UploadBatch) -> Result<Value, BackendError> {
        let mut form = Form::new();
        for (index, file) in batch.files().iter().enumerate() {
            form = form.part(ExtractRoute::Multi.field_name(), image_part(file, index)?);
        }
        let response = self.post_form(ExtractRoute::Multi.backend_path(), form).await?;
        decode_json(response).await
    }

    /// `{base}/export` with the serialized results as a text field
    ///
    /// Returns the spreadsheet bytes untouched.
    pub async fn export(&self, extracted_results: String) -> Result<Bytes, BackendError> {
        let form = Form::new().text("extracted_results", extracted_results);
        let response = self.post_form("/export", form).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Decode(format!("failed to read export body: {}", e)))?;
        debug!(bytes = body.len(), "Export body received from backend");
        Ok(body)
    }

    /// POST a form and fail on any non-success status
    async fn post_form(&self, path: &str, form: Form) -> Result<reqwest::Response, BackendError> {
        let url = self.endpoint(path);
        debug!(%url, "Forwarding to extraction backend");

        let response = self.http_client.post(url.clone()).multipart(form).send().await?;
        let status = response.status();
        info!(%url, status = status.as_u16(), "Extraction backend responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

/// Multipart part for one image, keeping its name and media type
fn image_part(file: &ImagePayload, index: usize) -> Result<Part, BackendError> {
    let filename = if file.filename().trim().is_empty() {
        format!("file_{}", index)
    } else {
        file.filename().to_string()
    };

    Part::stream_with_length(file.bytes().clone(), file.len() as u64)
        .file_name(filename)
        .mime_str(file.content_type())
        .map_err(|e| BackendError::Setup(format!("invalid media type: {}", e)))
}

async fn decode_json(response: reqwest::Response) -> Result<Value, BackendError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| BackendError::Decode(format!("failed to read body: {}", e)))?;
    serde_json::from_slice(&body)
        .map_err(|e| BackendError::Decode(format!("backend did not return JSON: {}", e)))
}
