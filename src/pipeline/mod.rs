//! Pipeline stages for document-to-text extraction.
//!
//! Each submodule implements exactly one transformation step, so each can
//! be tested on its own and backends (pdfium, tesseract) can be swapped
//! without touching the other stages.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌──▶ pdf ───────────────────────────────┐
//! validate ──┤   (pdfium)                            ├──▶ combined text
//!            └──▶ preprocess ──▶ ocr ──▶ postprocess ┘
//!                 (image)     (tesseract)  (cleanup)
//! ```
//!
//! 1. [`validate`]   — accept or reject each file by MIME type and size
//! 2. [`pdf`]        — read the text layer page by page; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`preprocess`] — upscale, grayscale and contrast-stretch images
//! 4. [`ocr`]        — drive a scoped OCR engine over the enhanced image
//! 5. [`tesseract`]  — the default OCR backend (the `tesseract` binary)
//! 6. [`postprocess`] — deterministic cleanup of recognised text

pub mod ocr;
pub mod pdf;
pub mod postprocess;
pub mod preprocess;
pub mod tesseract;
pub mod validate;
