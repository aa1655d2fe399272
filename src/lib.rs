//! # doc2social
//!
//! Extract text from PDFs and images, then turn it into social media
//! engagement suggestions.
//!
//! ## Why this crate?
//!
//! Content destined for social media arrives in whatever form is at hand:
//! exported slide decks, scanned flyers, screenshots. This crate reads the
//! text layer of PDFs directly and runs everything else through an OCR pass
//! tuned for printed and screenshot text, so a batch of mixed files becomes
//! one block of plain text ready for analysis.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Validate    MIME type + 10 MiB size limit (first failure aborts)
//!  ├─ 2. PDF         text layer via pdfium (spawn_blocking)
//!  │  or Image       upscale + grayscale + contrast → tesseract OCR
//!  ├─ 3. Combine     "--- Content from <name> ---" blocks, in order
//!  └─ 4. Suggest     hashtags, caption and tips (fallback set on failure)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2social::{analyze_files, ExtractionConfig, HttpSuggestionClient, InputFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let files = vec![
//!         InputFile::from_path("slides.pdf").await?,
//!         InputFile::from_path("flyer.png").await?,
//!     ];
//!     let config = ExtractionConfig::default();
//!     let client = HttpSuggestionClient::from_config(&config)?;
//!
//!     let output = analyze_files(&files, &config, &client).await?;
//!     println!("{}", output.text);
//!     if let Some(s) = output.suggestions {
//!         println!("{}", s.hashtags.join(" "));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2social` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! doc2social = { version = "0.3", default-features = false }
//! ```
//!
//! ## Runtime Requirements
//!
//! - the pdfium shared library, for PDFs
//! - the `tesseract` binary with the configured language data, for images
//!
//! Both can be replaced through [`ExtractionConfig`] with any
//! [`PdfBackend`] / [`OcrBackend`] implementation.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod suggest;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{analyze_files, process_files, validate_file, AnalysisOutput};
pub use config::{ExtractionConfig, ExtractionConfigBuilder, OcrSettings, PageSegMode};
pub use error::{ExtractError, RejectionReason};
pub use input::{FileKind, InputFile};
pub use pipeline::ocr::{OcrBackend, OcrEngine, OcrError};
pub use pipeline::pdf::{PdfBackend, PdfError, PdfiumBackend};
pub use pipeline::tesseract::TesseractBackend;
pub use pipeline::validate::ValidationResult;
pub use progress::{
    ExtractionProgressCallback, NoopProgressCallback, ProgressCallback, ProgressEvent, Stage,
};
pub use suggest::analyze::LlmSuggestionSource;
pub use suggest::client::HttpSuggestionClient;
pub use suggest::{SuggestError, SuggestionSource, Suggestions};
