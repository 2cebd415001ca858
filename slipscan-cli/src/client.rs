//! SlipScan relay client
//!
//! Picks the relay endpoint from the number of images (one → `/api/extract`,
//! two to ten → `/api/extract-multi`) and always hands back results in the
//! order the images were given, matched by filename.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use slipscan_common::config::normalize_base_url;
use slipscan_common::{ExtractRoute, ExtractionResult, ImagePayload, ResultSet, UploadBatch};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Relay address used when neither `--relay` nor the environment names one
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:5780";

/// Environment variable naming the relay address
pub const ENV_RELAY_URL: &str = "SLIPSCAN_RELAY_URL";

const USER_AGENT: &str = concat!("slipscan-cli/", env!("CARGO_PKG_VERSION"));

/// Relay client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally before any request was sent
    #[error(transparent)]
    Input(#[from] slipscan_common::Error),

    #[error("Could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Relay unreachable: {0}")]
    Transport(String),

    /// Relay answered with an error envelope
    #[error("Relay error {status}: {message}")]
    Relay { status: u16, message: String },

    #[error("Unexpected relay response: {0}")]
    Decode(String),
}

/// HTTP client for the relay's `/api/*` endpoints
pub struct RelayClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(base_url)?.ok_or_else(|| {
            slipscan_common::Error::Config("Relay URL must not be empty".to_string())
        })?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a batch and return one result per image, in input order
    pub async fn extract(&self, batch: &UploadBatch) -> Result<Vec<ExtractionResult>, ClientError> {
        let route = batch.route();
        let mut form = Form::new();
        for file in batch.files() {
            form = form.part(route.field_name(), image_part(file)?);
        }

        info!(files = batch.len(), path = route.relay_path(), "Uploading images");
        let response = self.post(route.relay_path(), form).await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        match route {
            ExtractRoute::Single => {
                let filename = batch.files()[0].filename();
                Ok(vec![ExtractionResult::from_single_response(value, filename)?])
            }
            ExtractRoute::Multi => {
                let set: ResultSet = serde_json::from_value(value)
                    .map_err(|e| ClientError::Decode(e.to_string()))?;
                Ok(set.align(&batch.filenames()))
            }
        }
    }

    /// Request the spreadsheet for `results`
    pub async fn export(&self, results: &[ExtractionResult]) -> Result<Bytes, ClientError> {
        let payload = serde_json::to_string(&ResultSet::new(results.to_vec()))
            .map_err(slipscan_common::Error::from)?;
        let form = Form::new().text("extracted_results", payload);

        let response = self.post("/api/export", form).await?;
        response
            .bytes()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn post(&self, path: &str, form: Form) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::Relay {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        Ok(response)
    }
}

/// The `error` string of a relay envelope, or the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn image_part(file: &ImagePayload) -> Result<Part, ClientError> {
    Part::stream_with_length(file.bytes().clone(), file.len() as u64)
        .file_name(file.filename().to_string())
        .mime_str(file.content_type())
        .map_err(|e| ClientError::Decode(format!("invalid media type: {}", e)))
}

/// Read image files into a validated batch
///
/// The file count is checked before anything is read.
pub async fn load_batch(paths: &[PathBuf]) -> Result<UploadBatch, ClientError> {
    ExtractRoute::for_count(paths.len())?;

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(load_image(path).await?);
    }
    Ok(UploadBatch::new(files)?)
}

/// Read one image; its media type is sniffed from the content
pub async fn load_image(path: &Path) -> Result<ImagePayload, ClientError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ImagePayload::new(filename, None, Bytes::from(bytes))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_envelope() {
        assert_eq!(error_message(r#"{"error":"Maximum 10 files allowed"}"#), "Maximum 10 files allowed");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(r#"{"detail":"x"}"#), r#"{"detail":"x"}"#);
    }

    #[test]
    fn test_relay_url_validated() {
        assert!(RelayClient::new("", Duration::from_secs(1)).is_err());
        assert!(RelayClient::new("localhost:5780", Duration::from_secs(1)).is_err());
        assert!(matches!(
            RelayClient::new("http://relay:notaport", Duration::from_secs(1)),
            Err(ClientError::Input(_))
        ));
        let client = RelayClient::new("http://127.0.0.1:5780/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:5780");
    }
}
