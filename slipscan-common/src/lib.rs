//! # SlipScan Common Library
//!
//! Shared code for the SlipScan relay and terminal client:
//! - Extraction result data model (`models`)
//! - Upload batch rules and endpoint routing (`batch`)
//! - Relay configuration loading (`config`)
//! - Result flattening and currency formatting (`display`)

pub mod batch;
pub mod config;
pub mod display;
pub mod error;
pub mod models;

pub use batch::{ExtractRoute, ImagePayload, UploadBatch, MAX_BATCH_FILES};
pub use error::{Error, Result};
pub use models::{ExtractedData, ExtractionResult, Party, ResultSet};
