//! Upload batch rules
//!
//! An [`UploadBatch`] can only be built through [`UploadBatch::new`], which
//! enforces the 1..=10 file count and the image media type rule. Anything
//! holding a batch therefore never needs to re-check those invariants.

use bytes::Bytes;

use crate::{Error, Result};

/// Maximum number of images accepted in one upload
pub const MAX_BATCH_FILES: usize = 10;

const GENERIC_BINARY: &str = "application/octet-stream";

/// One uploaded image: name, resolved media type and content
#[derive(Debug, Clone)]
pub struct ImagePayload {
    filename: String,
    content_type: String,
    bytes: Bytes,
}

impl ImagePayload {
    /// Validate an uploaded file as an image
    ///
    /// A declared `image/*` type is trusted. When the type is missing or the
    /// generic `application/octet-stream`, the content is sniffed and must be
    /// a known image format.
    pub fn new(
        filename: impl Into<String>,
        declared_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<Self> {
        let filename = filename.into();
        let declared = declared_type
            .map(essence)
            .filter(|t| !t.is_empty());

        let content_type = match declared.as_deref() {
            Some(t) if t.starts_with("image/") => t.to_string(),
            None | Some(GENERIC_BINARY) => sniff_image_type(&bytes).ok_or_else(|| {
                Error::InvalidInput(format!("'{}' is not a recognised image", filename))
            })?,
            Some(other) => {
                return Err(Error::InvalidInput(format!(
                    "'{}' is not an image (declared type: {})",
                    filename, other
                )))
            }
        };

        Ok(Self {
            filename,
            content_type,
            bytes,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Media type without parameters, lowercased
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn sniff_image_type(bytes: &[u8]) -> Option<String> {
    infer::get(bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .map(|kind| kind.mime_type().to_string())
}

/// Which relay endpoint an upload of a given size goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractRoute {
    /// Exactly one image: `/extract`, field `file`
    Single,
    /// Two to ten images: `/extract_multi`, field `files`
    Multi,
}

impl ExtractRoute {
    pub fn for_count(count: usize) -> Result<Self> {
        match count {
            0 => Err(Error::InvalidInput("No files provided".to_string())),
            1 => Ok(ExtractRoute::Single),
            n if n <= MAX_BATCH_FILES => Ok(ExtractRoute::Multi),
            n => Err(Error::InvalidInput(format!(
                "Maximum {} files allowed, got {}",
                MAX_BATCH_FILES, n
            ))),
        }
    }

    /// Path on the relay (client-facing)
    pub fn relay_path(&self) -> &'static str {
        match self {
            ExtractRoute::Single => "/api/extract",
            ExtractRoute::Multi => "/api/extract-multi",
        }
    }

    /// Path on the extraction backend
    pub fn backend_path(&self) -> &'static str {
        match self {
            ExtractRoute::Single => "/extract",
            ExtractRoute::Multi => "/extract_multi",
        }
    }

    /// Multipart field name carrying the image(s)
    pub fn field_name(&self) -> &'static str {
        match self {
            ExtractRoute::Single => "file",
            ExtractRoute::Multi => "files",
        }
    }
}

/// Ordered set of 1..=10 validated images submitted together
#[derive(Debug, Clone)]
pub struct UploadBatch {
    files: Vec<ImagePayload>,
}

impl UploadBatch {
    pub fn new(files: Vec<ImagePayload>) -> Result<Self> {
        ExtractRoute::for_count(files.len())?;
        Ok(Self { files })
    }

    pub fn files(&self) -> &[ImagePayload] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false for a constructed batch; present for API symmetry
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn route(&self) -> ExtractRoute {
        if self.files.len() == 1 {
            ExtractRoute::Single
        } else {
            ExtractRoute::Multi
        }
    }

    pub fn filenames(&self) -> Vec<String> {
        self.files.iter().map(|f| f.filename.clone()).collect()
    }

    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(ImagePayload::len).sum()
    }
}
