//! Error types for the doc2social library.
//!
//! Two layers of errors reflect two layers of the pipeline:
//!
//! * [`ExtractError`] — **Batch-fatal**: returned from
//!   [`crate::batch::process_files`] and [`crate::batch::analyze_files`].
//!   The first invalid or unprocessable file aborts the whole batch; text
//!   already extracted from earlier files is discarded, never returned.
//!
//! * Stage-local errors ([`crate::pipeline::pdf::PdfError`],
//!   [`crate::pipeline::ocr::OcrError`]) — raised by a single extractor and
//!   wrapped into an [`ExtractError`] that names the offending file.
//!
//! Suggestion failures are deliberately absent here: they are downgraded to
//! the fallback suggestion set and never reach the caller as an error.

use std::path::PathBuf;
use thiserror::Error;

/// Why a file was rejected before any extraction work began.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum RejectionReason {
    /// The declared MIME type is not in the accepted set.
    #[error("Unsupported file type. Upload PDF or image.")]
    UnsupportedType { mime: String },

    /// The file exceeds the configured size limit.
    #[error("File too large. Max {}MB.", max / (1024 * 1024))]
    TooLarge { size: u64, max: u64 },
}

/// All batch-fatal errors returned by the doc2social library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Validation ────────────────────────────────────────────────────────
    /// A file failed validation; the batch stops at this file.
    #[error("File \"{file_name}\": {reason}")]
    Validation {
        file_name: String,
        reason: RejectionReason,
    },

    // ── Extraction ────────────────────────────────────────────────────────
    /// The PDF structure could not be opened or a page could not be read.
    #[error("File \"{file_name}\": Failed to extract text from PDF: {detail}")]
    Pdf { file_name: String, detail: String },

    /// The OCR engine failed to start or to recognise the image.
    #[error("File \"{file_name}\": OCR failed: {detail}")]
    Ocr { file_name: String, detail: String },

    /// A single file exceeded the per-file wall-clock budget.
    #[error("File \"{file_name}\": processing timed out after {secs}s")]
    FileTimeout { file_name: String, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// An input file could not be read from disk.
    #[error("Failed to read input file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ExtractError {
    /// Name of the file that caused the failure, when the error is file-scoped.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            ExtractError::Validation { file_name, .. }
            | ExtractError::Pdf { file_name, .. }
            | ExtractError::Ocr { file_name, .. }
            | ExtractError::FileTimeout { file_name, .. } => Some(file_name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_names_file_and_reason() {
        let e = ExtractError::Validation {
            file_name: "notes.txt".into(),
            reason: RejectionReason::UnsupportedType {
                mime: "text/plain".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("notes.txt"), "got: {msg}");
        assert!(msg.contains("Unsupported file type"), "got: {msg}");
    }

    #[test]
    fn too_large_display_in_megabytes() {
        let r = RejectionReason::TooLarge {
            size: 11_000_000,
            max: 10 * 1024 * 1024,
        };
        assert_eq!(r.to_string(), "File too large. Max 10MB.");
    }

    #[test]
    fn pdf_error_wraps_parser_message() {
        let e = ExtractError::Pdf {
            file_name: "a.pdf".into(),
            detail: "bad xref".into(),
        };
        assert!(e
            .to_string()
            .contains("Failed to extract text from PDF: bad xref"));
        assert_eq!(e.file_name(), Some("a.pdf"));
    }

    #[test]
    fn ocr_error_display() {
        let e = ExtractError::Ocr {
            file_name: "scan.png".into(),
            detail: "engine crashed".into(),
        };
        assert!(e.to_string().contains("OCR failed: engine crashed"));
    }

    #[test]
    fn non_file_errors_have_no_file_name() {
        assert_eq!(ExtractError::InvalidConfig("x".into()).file_name(), None);
    }
}
