//! OCR through the `tesseract` command-line binary.
//!
//! Each acquired engine owns a private temp workspace. The preprocessed PNG
//! is written there, tesseract prints the recognised text to stdout, and
//! the workspace is removed when the engine terminates.

use crate::config::OcrSettings;
use crate::pipeline::ocr::{OcrBackend, OcrEngine, OcrError};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Runs the binary named by [`OcrSettings::tesseract_path`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TesseractBackend;

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn acquire(&self, settings: &OcrSettings) -> Result<Box<dyn OcrEngine>, OcrError> {
        let output = Command::new(&settings.tesseract_path)
            .arg("--version")
            .output();
        let version = handle_output(output, &settings.tesseract_path)?;
        debug!(
            "Using {}",
            version.lines().next().unwrap_or("tesseract (unknown version)")
        );

        let workspace = tempfile::Builder::new().prefix("doc2social-ocr-").tempdir()?;
        Ok(Box::new(TesseractEngine {
            settings: settings.clone(),
            workspace: Some(workspace),
        }))
    }
}

struct TesseractEngine {
    settings: OcrSettings,
    workspace: Option<TempDir>,
}

impl OcrEngine for TesseractEngine {
    fn recognize(&mut self, png: &[u8], on_fraction: &dyn Fn(f32)) -> Result<String, OcrError> {
        let workspace = self
            .workspace
            .as_ref()
            .ok_or_else(|| OcrError::EngineUnavailable("engine already terminated".into()))?;

        on_fraction(0.0);
        let input = workspace.path().join("input.png");
        std::fs::write(&input, png)?;

        let output = Command::new(&self.settings.tesseract_path)
            .args(tesseract_args(&input, &self.settings))
            .output();
        let text = handle_output(output, &self.settings.tesseract_path)?;
        on_fraction(1.0);

        debug!("tesseract recognised {} chars", text.len());
        Ok(text)
    }

    fn terminate(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            let path = workspace.path().to_path_buf();
            if let Err(e) = workspace.close() {
                warn!("Failed to remove OCR workspace {}: {}", path.display(), e);
            }
        }
    }
}

/// Command-line arguments for recognising `input` with `settings`.
pub fn tesseract_args(input: &Path, settings: &OcrSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        input.as_os_str().to_owned(),
        "stdout".into(),
        "-l".into(),
        settings.language.clone().into(),
        "--psm".into(),
        settings.page_seg_mode.as_psm().to_string().into(),
        "--dpi".into(),
        settings.dpi.to_string().into(),
    ];
    if settings.preserve_interword_spaces {
        args.push("-c".into());
        args.push("preserve_interword_spaces=1".into());
    }
    args
}

fn handle_output(result: std::io::Result<Output>, tool: &str) -> Result<String, OcrError> {
    match result {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(OcrError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::EngineUnavailable(
            format!("'{}' not found (install tesseract-ocr)", tool),
        )),
        Err(e) => Err(OcrError::Io(e)),
    }
}
