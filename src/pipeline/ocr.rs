//! Image text extraction: preprocess, recognise, sanitise.
//!
//! The OCR engine is a scoped resource. [`EngineGuard`] owns the instance
//! for exactly one recognition and terminates it when dropped, so the
//! engine is released on success, on error and while unwinding from a
//! panic inside the engine.

use crate::config::OcrSettings;
use crate::pipeline::postprocess::sanitize_ocr_text;
use crate::pipeline::preprocess::{preprocess, PreprocessError};
use crate::progress::{
    ocr_recognition_progress, recognition_detail, ProgressCallback, ProgressEvent, Stage,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Failures local to OCR.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The engine could not be started (missing binary, bad language data).
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine ran but reported a failure.
    #[error("{0}")]
    Recognition(String),

    #[error(transparent)]
    Image(#[from] PreprocessError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking OCR task panicked or was cancelled.
    #[error("OCR task failed: {0}")]
    Task(String),
}

/// Creates engine instances.
pub trait OcrBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Start an engine configured with `settings`.
    fn acquire(&self, settings: &OcrSettings) -> Result<Box<dyn OcrEngine>, OcrError>;
}

/// One live engine instance.
pub trait OcrEngine: Send {
    /// Recognise text in a PNG image.
    ///
    /// `on_fraction` receives completion in `[0, 1]` as the engine works.
    fn recognize(&mut self, png: &[u8], on_fraction: &dyn Fn(f32)) -> Result<String, OcrError>;

    /// Release every resource held by the engine.
    fn terminate(&mut self);
}

/// Terminates the wrapped engine exactly once, when dropped.
pub struct EngineGuard {
    engine: Option<Box<dyn OcrEngine>>,
}

impl EngineGuard {
    pub fn new(engine: Box<dyn OcrEngine>) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    pub fn recognize(&mut self, png: &[u8], on_fraction: &dyn Fn(f32)) -> Result<String, OcrError> {
        match self.engine.as_mut() {
            Some(engine) => engine.recognize(png, on_fraction),
            None => Err(OcrError::EngineUnavailable("engine already released".into())),
        }
    }
}

impl Drop for EngineGuard {
    fn drop(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.terminate();
            debug!("OCR engine released");
        }
    }
}

/// Recognise the text in an encoded image.
///
/// Emits `initializing`(5), `processing`(20) once the image is enhanced,
/// `recognizing` events climbing from 20 to 95, then `complete`(100).
pub async fn extract_image_text(
    bytes: Arc<[u8]>,
    backend: Arc<dyn OcrBackend>,
    settings: OcrSettings,
    progress: ProgressCallback,
) -> Result<String, OcrError> {
    progress.on_progress(&ProgressEvent::new(Stage::Initializing, 5));

    let enhanced = tokio::task::spawn_blocking(move || preprocess(&bytes))
        .await
        .map_err(|e| OcrError::Task(e.to_string()))??;

    progress.on_progress(
        &ProgressEvent::new(Stage::Processing, 20).with_detail("Enhancing image\u{2026}"),
    );

    let reporter = Arc::clone(&progress);
    let raw = tokio::task::spawn_blocking(move || {
        let mut engine = EngineGuard::new(backend.acquire(&settings)?);
        debug!("Acquired {} engine ({})", backend.name(), settings.language);
        engine.recognize(&enhanced, &|fraction: f32| {
            reporter.on_progress(
                &ProgressEvent::new(Stage::Recognizing, ocr_recognition_progress(fraction))
                    .with_detail(recognition_detail(fraction)),
            );
        })
    })
    .await
    .map_err(|e| OcrError::Task(e.to_string()))??;

    progress.on_progress(&ProgressEvent::new(Stage::Complete, 100));
    Ok(sanitize_ocr_text(&raw))
}
