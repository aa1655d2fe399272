//! Input files: an immutable blob plus its declared MIME type and name.
//!
//! The pipeline only ever reads an [`InputFile`]. Bytes are held in an
//! `Arc<[u8]>` so the extractors can move a handle onto the blocking pool
//! without copying the document.

use crate::error::ExtractError;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// MIME types accepted by the pipeline and the kind each maps to.
pub const ACCEPTED_MIME_TYPES: &[(&str, FileKind)] = &[
    ("application/pdf", FileKind::Pdf),
    ("image/jpeg", FileKind::Image),
    ("image/jpg", FileKind::Image),
    ("image/png", FileKind::Image),
    ("image/bmp", FileKind::Image),
    ("image/tiff", FileKind::Image),
    ("image/webp", FileKind::Image),
];

/// Which extractor handles a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Native PDF text extraction.
    Pdf,
    /// Preprocessing followed by OCR.
    Image,
}

impl FileKind {
    /// Classify a declared MIME type; `None` when it is not accepted.
    ///
    /// Matching is exact: `image/PNG` or `image/png; q=1` are rejected.
    pub fn from_mime(mime: &str) -> Option<Self> {
        ACCEPTED_MIME_TYPES
            .iter()
            .find(|(m, _)| *m == mime)
            .map(|(_, kind)| *kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Image => "image",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-supplied document. Never mutated once created.
#[derive(Clone)]
pub struct InputFile {
    name: String,
    mime_type: String,
    data: Arc<[u8]>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    ///
    /// Unknown extensions get `application/octet-stream`, which validation
    /// then rejects as unsupported.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mime = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream");
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Loaded {} ({} bytes, {})", name, data.len(), mime);
        Ok(Self::new(name, mime, data))
    }

    /// Display name, used in error messages and content headers.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// A cheap shared handle to the bytes.
    pub fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}
