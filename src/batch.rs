//! Batch entry points: validate, extract and combine a list of files.
//!
//! Files are processed strictly one after another. The first file that
//! fails validation or extraction aborts the batch and nothing extracted so
//! far is returned. Progress reporting still ends with a `complete`(100)
//! event on every path, so a progress bar can always close out.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::input::{FileKind, InputFile};
use crate::pipeline::ocr::{extract_image_text, OcrBackend};
use crate::pipeline::pdf::{extract_pdf_text, PdfBackend, PdfiumBackend};
use crate::pipeline::tesseract::TesseractBackend;
use crate::pipeline::validate::classify;
use crate::progress::{
    FileProgress, MonotonicProgress, NoopProgressCallback, ProgressCallback, ProgressEvent, Stage,
};
use crate::suggest::{suggest_or_fallback, SuggestionSource, Suggestions};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub use crate::pipeline::validate::validate_file;

/// Combined text of a batch plus the engagement suggestions derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// Trimmed combined text; empty when no file yielded any text.
    pub text: String,
    /// `None` when there was no text to analyse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Suggestions>,
}

/// Extract and combine the text of every file.
///
/// Each file with non-empty text contributes a block
/// `"\n\n--- Content from <name> ---\n<text>\n"`, in submission order; the
/// combined buffer is trimmed before it is returned.
///
/// # Errors
/// The first invalid or unprocessable file aborts the batch:
/// - [`ExtractError::Validation`] — unsupported type or oversize
/// - [`ExtractError::Pdf`] / [`ExtractError::Ocr`] — extraction failed
/// - [`ExtractError::FileTimeout`] — `file_timeout_secs` exceeded
pub async fn process_files(
    files: &[InputFile],
    config: &ExtractionConfig,
) -> Result<String, ExtractError> {
    let progress = progress_of(config);
    let result = run_batch(files, config, &progress).await;
    progress.on_progress(&ProgressEvent::new(Stage::Complete, 100));
    result
}

/// Like [`process_files`], then fetch engagement suggestions for the text.
///
/// When the combined text is non-empty an `analyzing`(90) event is emitted
/// and `source` is asked for suggestions; any suggestion failure falls back
/// to [`Suggestions::fallback`].
pub async fn analyze_files(
    files: &[InputFile],
    config: &ExtractionConfig,
    source: &dyn SuggestionSource,
) -> Result<AnalysisOutput, ExtractError> {
    let progress = progress_of(config);

    let result = match run_batch(files, config, &progress).await {
        Ok(text) if text.is_empty() => Ok(AnalysisOutput {
            text,
            suggestions: None,
        }),
        Ok(text) => {
            progress.on_progress(&ProgressEvent::new(Stage::Analyzing, 90));
            let suggestions = suggest_or_fallback(source, &text).await;
            Ok(AnalysisOutput {
                text,
                suggestions: Some(suggestions),
            })
        }
        Err(e) => Err(e),
    };

    progress.on_progress(&ProgressEvent::new(Stage::Complete, 100));
    result
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn progress_of(config: &ExtractionConfig) -> ProgressCallback {
    config
        .progress_callback
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback))
}

async fn run_batch(
    files: &[InputFile],
    config: &ExtractionConfig,
    progress: &ProgressCallback,
) -> Result<String, ExtractError> {
    let total = files.len();
    let start = Instant::now();
    info!("Processing {} file(s)", total);

    let pdf_backend: Arc<dyn PdfBackend> = config
        .pdf_backend
        .clone()
        .unwrap_or_else(|| Arc::new(PdfiumBackend::new()));
    let ocr_backend: Arc<dyn OcrBackend> = config
        .ocr_backend
        .clone()
        .unwrap_or_else(|| Arc::new(TesseractBackend));

    let mut combined = String::new();

    for (index, file) in files.iter().enumerate() {
        // ── Step 1: Validate ─────────────────────────────────────────────
        let kind = classify(file.mime_type(), file.size(), config.max_file_size).map_err(
            |reason| ExtractError::Validation {
                file_name: file.name().to_string(),
                reason,
            },
        )?;

        // ── Step 2: Announce the file ────────────────────────────────────
        let file_progress = Arc::new(FileProgress::new(
            Arc::clone(progress),
            index,
            total,
            file.name(),
        ));
        progress.on_progress(&file_progress.started());
        let local: ProgressCallback = Arc::new(MonotonicProgress::new(
            Arc::clone(&file_progress) as ProgressCallback,
        ));

        // ── Step 3: Extract ──────────────────────────────────────────────
        info!("File {}/{}: {} ({})", index + 1, total, file.name(), kind);
        let outcome = extract_one(file, kind, config, &pdf_backend, &ocr_backend, local).await;
        // A timed-out extractor is still running; silence it before the
        // batch reports `complete`.
        file_progress.close();
        let text = outcome?;

        // ── Step 4: Append ───────────────────────────────────────────────
        let text = text.trim();
        if text.is_empty() {
            debug!("{} yielded no text", file.name());
        } else {
            combined.push_str(&content_block(file.name(), text));
        }
    }

    info!(
        "Batch complete: {} file(s), {} chars, {}ms",
        total,
        combined.trim().len(),
        start.elapsed().as_millis()
    );
    Ok(combined.trim().to_string())
}

/// The delimiter block one file contributes to the combined text.
fn content_block(file_name: &str, text: &str) -> String {
    format!("\n\n--- Content from {} ---\n{}\n", file_name, text)
}

/// Dispatch one validated file to its extractor, under the optional
/// per-file budget.
///
/// On timeout the blocking task is left to finish on its own; its OCR
/// engine is still released when recognition returns.
async fn extract_one(
    file: &InputFile,
    kind: FileKind,
    config: &ExtractionConfig,
    pdf_backend: &Arc<dyn PdfBackend>,
    ocr_backend: &Arc<dyn OcrBackend>,
    progress: ProgressCallback,
) -> Result<String, ExtractError> {
    let file_name = file.name().to_string();

    let work = async {
        match kind {
            FileKind::Pdf => extract_pdf_text(file.shared_data(), Arc::clone(pdf_backend), progress)
                .await
                .map_err(|e| ExtractError::Pdf {
                    file_name: file_name.clone(),
                    detail: e.to_string(),
                }),
            FileKind::Image => extract_image_text(
                file.shared_data(),
                Arc::clone(ocr_backend),
                config.ocr.clone(),
                progress,
            )
            .await
            .map_err(|e| ExtractError::Ocr {
                file_name: file_name.clone(),
                detail: e.to_string(),
            }),
        }
    };

    match config.file_timeout_secs {
        Some(secs) => tokio::time::timeout(std::time::Duration::from_secs(secs), work)
            .await
            .map_err(|_| ExtractError::FileTimeout {
                file_name: file_name.clone(),
                secs,
            })?,
        None => work.await,
    }
}
