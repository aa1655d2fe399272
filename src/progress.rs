//! Progress events and the callback trait that receives them.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through each file.
//!
//! Extractors report progress on their own local 0–100 scale. The batch
//! orchestrator maps each file's local scale into that file's slice of the
//! whole batch with [`overall_progress`]; the mapping is plain arithmetic so
//! it can be tested without running an extractor.
//!
//! # Example
//!
//! ```rust
//! use doc2social::{ExtractionConfig, ProgressCallback, ProgressEvent};
//! use std::sync::Arc;
//!
//! let cb: ProgressCallback = Arc::new(|event: &ProgressEvent| {
//!     eprintln!("{:?} {}%", event.stage, event.progress);
//! });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(cb)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

/// Pipeline stage reported in a [`ProgressEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Loading,
    Parsing,
    Extracting,
    Initializing,
    Processing,
    Recognizing,
    ProcessingFile,
    Analyzing,
    Complete,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Loading => "loading",
            Stage::Parsing => "parsing",
            Stage::Extracting => "extracting",
            Stage::Initializing => "initializing",
            Stage::Processing => "processing",
            Stage::Recognizing => "recognizing",
            Stage::ProcessingFile => "processing_file",
            Stage::Analyzing => "analyzing",
            Stage::Complete => "complete",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single progress notification. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub stage: Stage,
    /// Percentage in `0..=100`.
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_files: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
}

impl ProgressEvent {
    /// A bare event carrying only a stage and a percentage.
    pub fn new(stage: Stage, progress: u8) -> Self {
        Self {
            stage,
            progress: progress.min(100),
            current_file: None,
            total_files: None,
            file_name: None,
            file_stage: None,
            detail: None,
            current_page: None,
            total_pages: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_page(mut self, current: usize, total: usize) -> Self {
        self.current_page = Some(current);
        self.total_pages = Some(total);
        self
    }
}

/// Receives progress events from the extraction pipeline.
///
/// Implementations must be `Send + Sync`: PDF and OCR work runs on the
/// blocking thread pool and reports from there. Events may fire dozens of
/// times per file, so implementations should return quickly.
pub trait ExtractionProgressCallback: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ExtractionProgressCallback for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

/// Clamps every forwarded event so `progress` never goes backwards.
///
/// Wraps the callback for one extraction run. OCR engines occasionally
/// report a lower fraction after a higher one; the caller still sees a
/// non-decreasing curve.
pub struct MonotonicProgress {
    inner: ProgressCallback,
    last: AtomicU8,
}

impl MonotonicProgress {
    pub fn new(inner: ProgressCallback) -> Self {
        Self {
            inner,
            last: AtomicU8::new(0),
        }
    }
}

impl ExtractionProgressCallback for MonotonicProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        let value = event.progress.min(100);
        let previous = self.last.fetch_max(value, Ordering::SeqCst);
        if value >= previous {
            self.inner.on_progress(event);
        } else {
            let mut clamped = event.clone();
            clamped.progress = previous;
            self.inner.on_progress(&clamped);
        }
    }
}

// ── Rescaling arithmetic ─────────────────────────────────────────────────

fn round_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Progress after finishing page `page` (1-indexed) of `total`: 15 → 85.
pub fn pdf_page_progress(page: usize, total: usize) -> u8 {
    if total == 0 {
        return 85;
    }
    round_percent(15.0 + (page as f64 / total as f64) * 70.0)
}

/// Progress while the OCR engine reports fraction `f` in `[0, 1]`: 20 → 95.
pub fn ocr_recognition_progress(fraction: f32) -> u8 {
    let f = f64::from(fraction.clamp(0.0, 1.0));
    round_percent(20.0 + f * 75.0)
}

/// Human-readable recognition detail, e.g. `"Recognizing… 42%"`.
pub fn recognition_detail(fraction: f32) -> String {
    let pct = (f64::from(fraction.clamp(0.0, 1.0)) * 100.0).round() as u8;
    format!("Recognizing\u{2026} {pct}%")
}

/// Map a file-local percentage into the file's slice of the batch.
///
/// `file_index` is 0-based. Each of the `total_files` files owns an equal
/// `100 / total_files` slice.
pub fn overall_progress(file_index: usize, total_files: usize, local: u8) -> u8 {
    if total_files == 0 {
        return 100;
    }
    let n = total_files as f64;
    round_percent((file_index as f64 / n) * 100.0 + f64::from(local.min(100)) / n)
}

/// Re-stamps inner extractor events as batch-level `processing_file` events.
///
/// Once [`FileProgress::close`] returns, every later event is dropped. An
/// extractor abandoned on timeout keeps running on the blocking pool and
/// must not report after the batch has emitted `complete`.
pub(crate) struct FileProgress {
    outer: ProgressCallback,
    file_index: usize,
    total_files: usize,
    file_name: String,
    closed: Mutex<bool>,
}

impl FileProgress {
    pub(crate) fn new(
        outer: ProgressCallback,
        file_index: usize,
        total_files: usize,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            outer,
            file_index,
            total_files,
            file_name: file_name.into(),
            closed: Mutex::new(false),
        }
    }

    /// The `processing_file` event emitted before the file's extractor starts.
    pub(crate) fn started(&self) -> ProgressEvent {
        let mut event = ProgressEvent::new(Stage::ProcessingFile, 0);
        event.current_file = Some(self.file_index + 1);
        event.total_files = Some(self.total_files);
        event.file_name = Some(self.file_name.clone());
        event
    }

    /// Stop forwarding. Waits for an event being forwarded right now.
    pub(crate) fn close(&self) {
        *self.closed.lock().unwrap_or_else(|e| e.into_inner()) = true;
    }
}

impl ExtractionProgressCallback for FileProgress {
    fn on_progress(&self, inner: &ProgressEvent) {
        // Held while forwarding so `close` cannot interleave with a send.
        let closed = self.closed.lock().unwrap_or_else(|e| e.into_inner());
        if *closed {
            return;
        }

        let mut event = ProgressEvent::new(
            Stage::ProcessingFile,
            overall_progress(self.file_index, self.total_files, inner.progress),
        );
        event.current_file = Some(self.file_index + 1);
        event.total_files = Some(self.total_files);
        event.file_name = Some(self.file_name.clone());
        event.file_stage = Some(inner.stage);
        event.detail = Some(match (inner.current_page, inner.total_pages) {
            (Some(page), Some(total)) => format!("Page {page}/{total}"),
            _ => inner.detail.clone().unwrap_or_default(),
        });
        self.outer.on_progress(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<ProgressEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let cb: ProgressCallback = Arc::new(move |e: &ProgressEvent| {
            sink.lock().unwrap().push(e.clone());
        });
        (cb, events)
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_progress(&ProgressEvent::new(Stage::Loading, 5));
        cb.on_progress(&ProgressEvent::new(Stage::Complete, 100));
    }

    #[test]
    fn pdf_curve_endpoints() {
        assert_eq!(pdf_page_progress(1, 1), 85);
        assert_eq!(pdf_page_progress(1, 3), 38);
        assert_eq!(pdf_page_progress(2, 3), 62);
        assert_eq!(pdf_page_progress(3, 3), 85);
        assert_eq!(pdf_page_progress(0, 0), 85);
    }

    #[test]
    fn ocr_curve_is_clamped() {
        assert_eq!(ocr_recognition_progress(0.0), 20);
        assert_eq!(ocr_recognition_progress(0.5), 58);
        assert_eq!(ocr_recognition_progress(1.0), 95);
        assert_eq!(ocr_recognition_progress(7.0), 95);
        assert_eq!(ocr_recognition_progress(-1.0), 20);
    }

    #[test]
    fn recognition_detail_formats_percentage() {
        assert_eq!(recognition_detail(0.42), "Recognizing\u{2026} 42%");
    }

    #[test]
    fn overall_progress_slices_batch() {
        assert_eq!(overall_progress(0, 1, 50), 50);
        assert_eq!(overall_progress(0, 2, 100), 50);
        assert_eq!(overall_progress(1, 2, 0), 50);
        assert_eq!(overall_progress(1, 2, 100), 100);
        assert_eq!(overall_progress(2, 3, 85), 95);
        assert_eq!(overall_progress(0, 0, 10), 100);
    }

    #[test]
    fn monotonic_clamps_regressions() {
        let (cb, events) = recorder();
        let mono = MonotonicProgress::new(cb);
        for p in [5u8, 20, 60, 40, 95] {
            mono.on_progress(&ProgressEvent::new(Stage::Recognizing, p));
        }
        let seen: Vec<u8> = events.lock().unwrap().iter().map(|e| e.progress).collect();
        assert_eq!(seen, vec![5, 20, 60, 60, 95]);
    }

    #[test]
    fn file_progress_restamps_pdf_page_detail() {
        let (cb, events) = recorder();
        let fp = FileProgress::new(cb, 1, 2, "b.pdf");
        fp.on_progress(&ProgressEvent::new(Stage::Extracting, 85).with_page(3, 3));

        let events = events.lock().unwrap();
        let e = &events[0];
        assert_eq!(e.stage, Stage::ProcessingFile);
        assert_eq!(e.progress, 93);
        assert_eq!(e.current_file, Some(2));
        assert_eq!(e.total_files, Some(2));
        assert_eq!(e.file_name.as_deref(), Some("b.pdf"));
        assert_eq!(e.file_stage, Some(Stage::Extracting));
        assert_eq!(e.detail.as_deref(), Some("Page 3/3"));
    }

    #[test]
    fn file_progress_forwards_ocr_detail() {
        let (cb, events) = recorder();
        let fp = FileProgress::new(cb, 0, 1, "scan.png");
        fp.on_progress(&ProgressEvent::new(Stage::Processing, 20).with_detail("Enhancing image\u{2026}"));
        assert_eq!(
            events.lock().unwrap()[0].detail.as_deref(),
            Some("Enhancing image\u{2026}")
        );
    }

    #[test]
    fn closed_file_progress_drops_late_events() {
        let (cb, events) = recorder();
        let fp = FileProgress::new(cb, 0, 1, "slow.png");
        fp.on_progress(&ProgressEvent::new(Stage::Recognizing, 28));
        fp.close();
        fp.on_progress(&ProgressEvent::new(Stage::Recognizing, 87));
        fp.close();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].progress, 28);
    }

    #[test]
    fn event_serialises_camel_case_and_skips_none() {
        let json = serde_json::to_string(&ProgressEvent::new(Stage::ProcessingFile, 0)).unwrap();
        assert_eq!(json, r#"{"stage":"processing_file","progress":0}"#);

        let json =
            serde_json::to_string(&ProgressEvent::new(Stage::Extracting, 38).with_page(1, 3)).unwrap();
        assert!(json.contains(r#""currentPage":1"#));
        assert!(json.contains(r#""totalPages":3"#));
    }
}
