//! Configuration types for document extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Pre-constructed backends (PDF, OCR)
//! can be injected the same way, which is how tests swap pdfium and the
//! tesseract binary for in-memory fakes.

use crate::error::ExtractError;
use crate::pipeline::ocr::OcrBackend;
use crate::pipeline::pdf::PdfBackend;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Maximum accepted input size: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default base URL of the suggestion service.
pub const DEFAULT_SUGGESTION_API_BASE: &str = "http://localhost:5000";

/// Configuration for a batch extraction.
///
/// # Example
/// ```rust
/// use doc2social::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .ocr_language("deu")
///     .file_timeout_secs(120)
///     .build()
///     .unwrap();
/// assert_eq!(config.ocr.language, "deu");
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Per-file size limit in bytes. Default: 10 485 760.
    pub max_file_size: u64,

    /// OCR engine parameters.
    pub ocr: OcrSettings,

    /// Per-file wall-clock budget in seconds. Default: none.
    ///
    /// OCR time grows with image complexity and has no natural bound. When
    /// set, a file that exceeds the budget aborts the whole batch.
    pub file_timeout_secs: Option<u64>,

    /// Base URL of the suggestion service (`POST {base}/api/analyze-content`).
    pub suggestion_api_base: String,

    /// Timeout for the suggestion request in seconds. Default: 30.
    pub suggestion_timeout_secs: u64,

    /// Pre-constructed PDF backend. Default: pdfium.
    pub pdf_backend: Option<Arc<dyn PdfBackend>>,

    /// Pre-constructed OCR backend. Default: the `tesseract` binary.
    pub ocr_backend: Option<Arc<dyn OcrBackend>>,

    /// Receives progress events. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            ocr: OcrSettings::default(),
            file_timeout_secs: None,
            suggestion_api_base: DEFAULT_SUGGESTION_API_BASE.to_string(),
            suggestion_timeout_secs: 30,
            pdf_backend: None,
            ocr_backend: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_file_size", &self.max_file_size)
            .field("ocr", &self.ocr)
            .field("file_timeout_secs", &self.file_timeout_secs)
            .field("suggestion_api_base", &self.suggestion_api_base)
            .field("suggestion_timeout_secs", &self.suggestion_timeout_secs)
            .field("pdf_backend", &self.pdf_backend.as_ref().map(|b| b.name()))
            .field("ocr_backend", &self.ocr_backend.as_ref().map(|b| b.name()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr.language = lang.into();
        self
    }

    pub fn page_seg_mode(mut self, mode: PageSegMode) -> Self {
        self.config.ocr.page_seg_mode = mode;
        self
    }

    pub fn preserve_interword_spaces(mut self, v: bool) -> Self {
        self.config.ocr.preserve_interword_spaces = v;
        self
    }

    pub fn ocr_dpi(mut self, dpi: u32) -> Self {
        self.config.ocr.dpi = dpi;
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<String>) -> Self {
        self.config.ocr.tesseract_path = path.into();
        self
    }

    pub fn file_timeout_secs(mut self, secs: u64) -> Self {
        self.config.file_timeout_secs = Some(secs.max(1));
        self
    }

    pub fn suggestion_api_base(mut self, base: impl Into<String>) -> Self {
        self.config.suggestion_api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn suggestion_timeout_secs(mut self, secs: u64) -> Self {
        self.config.suggestion_timeout_secs = secs.max(1);
        self
    }

    pub fn pdf_backend(mut self, backend: Arc<dyn PdfBackend>) -> Self {
        self.config.pdf_backend = Some(backend);
        self
    }

    pub fn ocr_backend(mut self, backend: Arc<dyn OcrBackend>) -> Self {
        self.config.ocr_backend = Some(backend);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.max_file_size == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_file_size must be > 0".into(),
            ));
        }
        if c.ocr.language.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if !(70..=2400).contains(&c.ocr.dpi) {
            return Err(ExtractError::InvalidConfig(format!(
                "OCR DPI must be 70–2400, got {}",
                c.ocr.dpi
            )));
        }
        Ok(self.config)
    }
}

// ── OCR settings ─────────────────────────────────────────────────────────

/// Parameters handed to the OCR engine when an instance is acquired.
///
/// The defaults target single-column printed or screenshot text: one
/// uniform block, interword spacing kept, 300 DPI hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Tesseract language code(s), e.g. `"eng"` or `"eng+deu"`.
    pub language: String,
    pub page_seg_mode: PageSegMode,
    pub preserve_interword_spaces: bool,
    /// Resolution hint passed to the engine (`user_defined_dpi`).
    pub dpi: u32,
    /// Binary name or absolute path of the tesseract executable.
    pub tesseract_path: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            page_seg_mode: PageSegMode::SingleBlock,
            preserve_interword_spaces: true,
            dpi: 300,
            tesseract_path: "tesseract".to_string(),
        }
    }
}

/// Tesseract page-segmentation modes that make sense for this pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSegMode {
    /// Fully automatic page segmentation (3).
    Auto,
    /// Single column of text of variable sizes (4).
    SingleColumn,
    /// Single uniform block of text (6). (default)
    #[default]
    SingleBlock,
    /// Sparse text, no particular order (11).
    SparseText,
}

impl PageSegMode {
    /// The numeric `--psm` value understood by tesseract.
    pub fn as_psm(&self) -> u8 {
        match self {
            PageSegMode::Auto => 3,
            PageSegMode::SingleColumn => 4,
            PageSegMode::SingleBlock => 6,
            PageSegMode::SparseText => 11,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ExtractionConfig::default();
        assert_eq!(c.max_file_size, 10_485_760);
        assert_eq!(c.ocr.language, "eng");
        assert_eq!(c.ocr.page_seg_mode.as_psm(), 6);
        assert!(c.ocr.preserve_interword_spaces);
        assert_eq!(c.ocr.dpi, 300);
        assert!(c.file_timeout_secs.is_none());
        assert_eq!(c.suggestion_api_base, "http://localhost:5000");
    }

    #[test]
    fn builder_trims_trailing_slash_from_api_base() {
        let c = ExtractionConfig::builder()
            .suggestion_api_base("https://api.example.org/")
            .build()
            .unwrap();
        assert_eq!(c.suggestion_api_base, "https://api.example.org");
    }

    #[test]
    fn build_rejects_zero_size_limit() {
        let err = ExtractionConfig::builder().max_file_size(0).build().unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_empty_language() {
        assert!(ExtractionConfig::builder().ocr_language("  ").build().is_err());
    }

    #[test]
    fn build_rejects_out_of_range_dpi() {
        assert!(ExtractionConfig::builder().ocr_dpi(10).build().is_err());
        assert!(ExtractionConfig::builder().ocr_dpi(600).build().is_ok());
    }

    #[test]
    fn debug_hides_callback_internals() {
        let c = ExtractionConfig::builder()
            .progress_callback(Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn ExtractionProgressCallback>"));
    }
}
