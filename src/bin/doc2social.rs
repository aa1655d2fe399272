//! CLI binary for doc2social.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, drives a progress bar and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use doc2social::{
    analyze_files, process_files, AnalysisOutput, ExtractionConfig, ExtractionProgressCallback,
    HttpSuggestionClient, InputFile, LlmSuggestionSource, ProgressCallback, ProgressEvent, Stage,
    SuggestionSource, Suggestions,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Renders batch progress (0–100) as a single bar with the current file and
/// stage as its message.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_progress(&self, event: &ProgressEvent) {
        match event.stage {
            Stage::Complete => {
                self.bar.set_position(100);
                self.bar.finish_and_clear();
                return;
            }
            Stage::Analyzing => self.bar.set_prefix("Analyzing"),
            _ => {}
        }

        // The per-file `processing_file` event starts at 0; never move backwards.
        if u64::from(event.progress) > self.bar.position() {
            self.bar.set_position(u64::from(event.progress));
        }

        let mut msg = String::new();
        if let (Some(current), Some(total)) = (event.current_file, event.total_files) {
            msg.push_str(&format!("{current}/{total} "));
        }
        if let Some(ref name) = event.file_name {
            msg.push_str(name);
        }
        if let Some(stage) = event.file_stage {
            msg.push_str(&format!(" \u{2022} {}", stage.as_str().replace('_', " ")));
        }
        if let Some(ref detail) = event.detail {
            if !detail.is_empty() {
                msg.push_str(&format!("  {}", dim(detail)));
            }
        }
        self.bar.set_message(msg);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract text and get suggestions from the local service
  doc2social slides.pdf flyer.png

  # Text only, no suggestions
  doc2social --no-suggest scan.jpg

  # Suggestions straight from an LLM instead of the service
  doc2social --local --provider openai --model gpt-4.1-nano notes.pdf

  # JSON output (text + suggestions)
  doc2social --json report.pdf > output.json

ACCEPTED FILES:
  application/pdf, image/jpeg, image/png, image/bmp, image/tiff, image/webp
  Max 10 MB per file. The first invalid file aborts the whole batch.

ENVIRONMENT VARIABLES:
  DOC2SOCIAL_API_BASE     Suggestion service base URL (default http://localhost:5000)
  DOC2SOCIAL_LANG         Tesseract language (default eng)
  DOC2SOCIAL_TESSERACT    tesseract binary name or path
  DOC2SOCIAL_TIMEOUT      Per-file time budget in seconds
  EDGEQUAKE_PROVIDER      LLM provider for --local (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         LLM model for --local
  RUST_LOG                Override log filter
"#;

/// Extract text from PDFs and images and suggest how to post it.
#[derive(Parser, Debug)]
#[command(
    name = "doc2social",
    version,
    about = "Extract text from PDFs and images and suggest hashtags, a caption and tips",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF or image files, processed in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output structured JSON (text + suggestions).
    #[arg(long, env = "DOC2SOCIAL_JSON")]
    json: bool,

    /// Only extract text; skip engagement suggestions.
    #[arg(long, env = "DOC2SOCIAL_NO_SUGGEST")]
    no_suggest: bool,

    /// Base URL of the suggestion service.
    #[arg(
        long,
        env = "DOC2SOCIAL_API_BASE",
        default_value = doc2social::config::DEFAULT_SUGGESTION_API_BASE
    )]
    api_base: String,

    /// Ask an LLM directly instead of the suggestion service.
    #[arg(long, env = "DOC2SOCIAL_LOCAL")]
    local: bool,

    /// LLM provider for --local. Auto-detected from API key env vars if not set.
    #[arg(long, env = "EDGEQUAKE_PROVIDER", requires = "local")]
    provider: Option<String>,

    /// LLM model ID for --local.
    #[arg(long, env = "EDGEQUAKE_MODEL", requires = "local")]
    model: Option<String>,

    /// Tesseract language code(s), e.g. eng or eng+deu.
    #[arg(long, env = "DOC2SOCIAL_LANG", default_value = "eng")]
    lang: String,

    /// tesseract binary name or path.
    #[arg(long, env = "DOC2SOCIAL_TESSERACT", default_value = "tesseract")]
    tesseract: String,

    /// Per-file time budget in seconds; exceeding it aborts the batch.
    #[arg(long, env = "DOC2SOCIAL_TIMEOUT")]
    timeout: Option<u64>,

    /// Suggestion request timeout in seconds.
    #[arg(long, env = "DOC2SOCIAL_API_TIMEOUT", default_value_t = 30)]
    api_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "DOC2SOCIAL_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2SOCIAL_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2SOCIAL_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Load inputs ──────────────────────────────────────────────────────
    let mut files = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let file = InputFile::from_path(path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?;
        files.push(file);
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = if cli.no_suggest {
        let text = process_files(&files, &config)
            .await
            .context("Extraction failed")?;
        AnalysisOutput {
            text,
            suggestions: None,
        }
    } else {
        let source = build_source(&cli, &config)?;
        analyze_files(&files, &config, source.as_ref())
            .await
            .context("Extraction failed")?
    };

    // ── Print ────────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(output.text.as_bytes())
        .context("Failed to write to stdout")?;
    if !output.text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    drop(handle);

    match output.suggestions {
        Some(ref s) => print_suggestions(s),
        None if !cli.quiet && output.text.is_empty() => {
            eprintln!("{} no text found in {} file(s)", cyan("⚠"), files.len());
        }
        None => {}
    }

    if !cli.quiet {
        eprintln!(
            "{} {} file(s), {} chars extracted",
            green("✔"),
            files.len(),
            output.text.len()
        );
    }
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .ocr_language(cli.lang.clone())
        .tesseract_path(cli.tesseract.clone())
        .suggestion_api_base(cli.api_base.clone())
        .suggestion_timeout_secs(cli.api_timeout);

    if let Some(secs) = cli.timeout {
        builder = builder.file_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// The HTTP service by default; an LLM provider with `--local`.
fn build_source(cli: &Cli, config: &ExtractionConfig) -> Result<Box<dyn SuggestionSource>> {
    if !cli.local {
        let client = HttpSuggestionClient::from_config(config)
            .context("Failed to configure suggestion client")?;
        return Ok(Box::new(client));
    }

    let source = match cli.provider {
        Some(ref name) => {
            let model = cli.model.as_deref().unwrap_or("gpt-4.1-nano");
            LlmSuggestionSource::from_name(name, model)
        }
        None => LlmSuggestionSource::from_env(),
    }
    .context("Failed to configure LLM provider")?;
    Ok(Box::new(source))
}

fn print_suggestions(s: &Suggestions) {
    println!();
    println!("{}", bold("Hashtags"));
    println!("  {}", cyan(&s.hashtags.join(" ")));
    println!();
    println!("{}", bold("Caption"));
    println!("  {}", s.caption);
    println!();
    println!("{}", bold("Tips"));
    for (i, tip) in s.tips.iter().enumerate() {
        println!("  {}. {}", i + 1, tip);
    }
}
