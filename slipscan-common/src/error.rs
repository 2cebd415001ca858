//! Common error types for SlipScan

use thiserror::Error;

/// Common result type for SlipScan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the relay and the terminal client
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input (file count, media type, malformed JSON)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
