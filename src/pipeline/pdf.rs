//! Native PDF text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async contexts. The whole
//! open → iterate → close sequence therefore runs on the blocking pool.
//!
//! ## Page sources
//!
//! The page loop in [`extract_pages`] only sees a [`PageTextSource`]: a page
//! count plus the text runs of each page. [`PdfiumBackend`] adapts a loaded
//! pdfium document to that seam; tests use an in-memory source instead.

use crate::progress::{pdf_page_progress, ExtractionProgressCallback, ProgressCallback, ProgressEvent, Stage};
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failures local to PDF extraction.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The pdfium shared library could not be loaded.
    #[error("pdfium library unavailable: {0}")]
    Binding(String),

    /// The bytes are not a parseable PDF structure.
    #[error("{0}")]
    InvalidPdf(String),

    #[error("document is password protected")]
    PasswordRequired,

    #[error("page {page}: {detail}")]
    Page { page: usize, detail: String },

    /// The blocking extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Read access to the text of an opened document.
pub trait PageTextSource {
    fn page_count(&self) -> usize;

    /// Raw textual runs of page `index` (0-based), in reading order.
    fn page_runs(&self, index: usize) -> Result<Vec<String>, PdfError>;
}

/// Opens PDF bytes and hands the document to `visit` while it is open.
///
/// The document only lives for the duration of the call, so the visitor
/// does all page work and returns the extracted text.
pub trait PdfBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn open(
        &self,
        bytes: &[u8],
        visit: &mut dyn FnMut(&dyn PageTextSource) -> Result<String, PdfError>,
    ) -> Result<String, PdfError>;
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// Default backend: the pdfium shared library.
///
/// Looks in `library_dir` first (when set), then the current directory,
/// then the system library path.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library_dir: Option<PathBuf>,
}

impl PdfiumBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: Some(dir.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, PdfError> {
        let dir = self
            .library_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("./"));
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| PdfError::Binding(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

struct PdfiumDocument<'doc, 'lib> {
    document: &'doc PdfDocument<'lib>,
}

impl PageTextSource for PdfiumDocument<'_, '_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_runs(&self, index: usize) -> Result<Vec<String>, PdfError> {
        let page_error = |e: PdfiumError| PdfError::Page {
            page: index + 1,
            detail: format!("{:?}", e),
        };
        let page = self
            .document
            .pages()
            .get(index as PdfPageIndex)
            .map_err(page_error)?;
        let text = page.text().map_err(page_error)?;

        let runs: Vec<String> = text.segments().iter().map(|s| s.text()).collect();
        if runs.is_empty() {
            // Some producers emit no segments but still carry a text layer.
            return Ok(vec![text.all()]);
        }
        Ok(runs)
    }
}

impl PdfBackend for PdfiumBackend {
    fn name(&self) -> &'static str {
        "pdfium"
    }

    fn open(
        &self,
        bytes: &[u8],
        visit: &mut dyn FnMut(&dyn PageTextSource) -> Result<String, PdfError>,
    ) -> Result<String, PdfError> {
        let pdfium = self.bind()?;
        let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                PdfError::PasswordRequired
            } else {
                PdfError::InvalidPdf(err_str)
            }
        })?;
        visit(&PdfiumDocument {
            document: &document,
        })
    }
}

// ── Page loop ────────────────────────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Join a page's runs with single spaces, collapse whitespace, trim.
pub fn normalise_page_text(runs: &[String]) -> String {
    let joined = runs.join(" ");
    RE_WHITESPACE.replace_all(&joined, " ").trim().to_string()
}

/// Walk every page of `source`, reporting `extracting` after each one.
///
/// Non-empty pages are appended followed by a blank line; the result is
/// trimmed.
pub fn extract_pages(
    source: &dyn PageTextSource,
    progress: &dyn ExtractionProgressCallback,
) -> Result<String, PdfError> {
    let total = source.page_count();
    info!("PDF loaded: {} pages", total);

    let mut buffer = String::new();
    for index in 0..total {
        let page = index + 1;
        let text = normalise_page_text(&source.page_runs(index)?);
        if text.is_empty() {
            warn!("Page {} has no extractable text", page);
        } else {
            debug!("Page {} → {} chars", page, text.len());
            buffer.push_str(&text);
            buffer.push_str("\n\n");
        }
        progress.on_progress(
            &ProgressEvent::new(Stage::Extracting, pdf_page_progress(page, total))
                .with_page(page, total),
        );
    }

    Ok(buffer.trim().to_string())
}

/// Extract the text layer of a PDF.
///
/// Emits `loading`(5), `parsing`(15), one `extracting` event per page
/// climbing to 85, then `complete`(100).
pub async fn extract_pdf_text(
    bytes: Arc<[u8]>,
    backend: Arc<dyn PdfBackend>,
    progress: ProgressCallback,
) -> Result<String, PdfError> {
    progress.on_progress(&ProgressEvent::new(Stage::Loading, 5));

    let reporter = Arc::clone(&progress);
    let text = tokio::task::spawn_blocking(move || {
        backend.open(&bytes, &mut |source: &dyn PageTextSource| {
            reporter.on_progress(&ProgressEvent::new(Stage::Parsing, 15));
            extract_pages(source, reporter.as_ref())
        })
    })
    .await
    .map_err(|e| PdfError::Task(e.to_string()))??;

    progress.on_progress(&ProgressEvent::new(Stage::Complete, 100));
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakePages(Vec<Vec<&'static str>>);

    impl PageTextSource for FakePages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn page_runs(&self, index: usize) -> Result<Vec<String>, PdfError> {
            Ok(self.0[index].iter().map(|s| s.to_string()).collect())
        }
    }

    struct FakeBackend(Vec<Vec<&'static str>>);

    impl PdfBackend for FakeBackend {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn open(
            &self,
            bytes: &[u8],
            visit: &mut dyn FnMut(&dyn PageTextSource) -> Result<String, PdfError>,
        ) -> Result<String, PdfError> {
            if !bytes.starts_with(b"%PDF") {
                return Err(PdfError::InvalidPdf("missing header".into()));
            }
            visit(&FakePages(self.0.clone()))
        }
    }

    fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<ProgressEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let cb: ProgressCallback = Arc::new(move |e: &ProgressEvent| {
            sink.lock().unwrap().push(e.clone());
        });
        (cb, events)
    }

    #[test]
    fn normalises_runs() {
        let runs = vec!["  Hello\t".to_string(), "big \n\n world ".to_string()];
        assert_eq!(normalise_page_text(&runs), "Hello big world");
    }

    #[test]
    fn pages_are_kept_in_order_and_separated() {
        let source = FakePages(vec![vec!["Page 1"], vec!["Page", "2"], vec!["Page 3"]]);
        let text = extract_pages(&source, &crate::progress::NoopProgressCallback).unwrap();
        assert_eq!(text, "Page 1\n\nPage 2\n\nPage 3");
    }

    #[test]
    fn blank_pages_are_skipped() {
        let source = FakePages(vec![vec!["  "], vec!["only"], vec![]]);
        let text = extract_pages(&source, &crate::progress::NoopProgressCallback).unwrap();
        assert_eq!(text, "only");
    }

    #[tokio::test]
    async fn emits_the_documented_progress_curve() {
        let (cb, events) = recorder();
        let backend = Arc::new(FakeBackend(vec![vec!["Page 1"], vec!["Page 2"], vec!["Page 3"]]));
        let text = extract_pdf_text(Arc::from(&b"%PDF-1.7"[..]), backend, cb).await.unwrap();
        assert_eq!(text, "Page 1\n\nPage 2\n\nPage 3");

        let events = events.lock().unwrap();
        let curve: Vec<(Stage, u8)> = events.iter().map(|e| (e.stage, e.progress)).collect();
        assert_eq!(
            curve,
            vec![
                (Stage::Loading, 5),
                (Stage::Parsing, 15),
                (Stage::Extracting, 38),
                (Stage::Extracting, 62),
                (Stage::Extracting, 85),
                (Stage::Complete, 100),
            ]
        );
        assert_eq!(events[4].current_page, Some(3));
        assert_eq!(events[4].total_pages, Some(3));
    }

    #[tokio::test]
    async fn unparseable_bytes_fail_without_completing() {
        let (cb, events) = recorder();
        let err = extract_pdf_text(Arc::from(&b"garbage"[..]), Arc::new(FakeBackend(vec![])), cb)
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::InvalidPdf(_)));
        let stages: Vec<Stage> = events.lock().unwrap().iter().map(|e| e.stage).collect();
        assert_eq!(stages, vec![Stage::Loading]);
    }

    #[tokio::test]
    async fn pdfium_rejects_non_pdf_bytes() {
        if std::env::var("PDFIUM_TESTS").is_err() {
            return;
        }
        let err = extract_pdf_text(
            Arc::from(&b"not a pdf"[..]),
            Arc::new(PdfiumBackend::new()),
            Arc::new(crate::progress::NoopProgressCallback),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PdfError::InvalidPdf(_)));
    }
}
