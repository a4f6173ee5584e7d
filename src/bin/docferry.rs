//! CLI binary for docferry.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `WorkflowConfig`, plays the role of the file picker (declaring a MIME
//! type from the extension, as a picker would), and renders workflow
//! events on a spinner.

use anyhow::{bail, Context, Result};
use clap::Parser;
use docferry::{
    ConversionMode, ConversionResult, FileCandidate, HttpConversionService, TransferController,
    WorkflowConfig, WorkflowEventCallback, DOCX_MIME, DOC_MIME, PDF_MIME,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Spinner-backed event callback ────────────────────────────────────────────

/// Terminal event callback: one spinner line that follows the workflow.
struct SpinnerEvents {
    bar: ProgressBar,
}

impl SpinnerEvents {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl WorkflowEventCallback for SpinnerEvents {
    fn on_file_accepted(&self, name: &str, size: u64) {
        self.bar.println(format!(
            "{} {}  {}",
            green("✓"),
            name,
            dim(&format!("{:.1} KiB", size as f64 / 1024.0))
        ));
    }

    fn on_file_rejected(&self, message: &str) {
        self.bar.println(format!("{} {}", red("✗"), red(message)));
    }

    fn on_submit_started(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    fn on_conversion_succeeded(&self, download_name: &str) {
        self.bar.set_message("");
        self.bar
            .println(format!("{} converted → {}", green("✓"), bold(download_name)));
    }

    fn on_conversion_failed(&self, message: &str) {
        self.bar.set_message("");
        self.bar.println(format!("{} {}", red("✗"), red(message)));
    }

    fn on_download_finished(&self, path: &Path) {
        self.bar
            .println(format!("{} saved to {}", green("✓"), bold(&path.display().to_string())));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # PDF → Word (default mode), saved into the current directory
  docferry report.pdf

  # Word → PDF into a downloads directory
  docferry --mode docx-to-pdf letter.docx -o ~/Downloads

  # Against a remote service
  docferry --service-url https://converter.example.com report.pdf

CONVERSION MODES:
  pdf-to-docx   accepts .pdf            (default)
  docx-to-pdf   accepts .docx and .doc

ENVIRONMENT VARIABLES:
  DOCFERRY_SERVICE_URL    Conversion service base URL (default: http://localhost:5000)
  DOCFERRY_MODE           Conversion mode
  DOCFERRY_OUTPUT_DIR     Where downloaded artifacts are written
  RUST_LOG                Tracing filter override (e.g. docferry=debug)

NOTES:
  Files over 16 MiB are rejected locally, before any upload.
  After a download the server's copy is removed by a deferred best-effort
  cleanup call; the binary waits it out unless --no-cleanup-wait is set.
"#;

/// Convert a document through a remote PDF ⇄ Word conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "docferry",
    version,
    about = "Convert a document through a remote PDF ⇄ Word conversion service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document to convert (.pdf, .docx, or .doc).
    input: PathBuf,

    /// Conversion direction.
    #[arg(long, value_enum, env = "DOCFERRY_MODE", default_value = "pdf-to-docx")]
    mode: ModeArg,

    /// Directory the converted file is written into.
    #[arg(short, long, env = "DOCFERRY_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Base URL of the conversion service.
    #[arg(long, env = "DOCFERRY_SERVICE_URL", default_value = "http://localhost:5000")]
    service_url: String,

    /// Delay before the post-download cleanup call, in milliseconds.
    #[arg(long, env = "DOCFERRY_CLEANUP_DELAY_MS", default_value_t = 3000)]
    cleanup_delay_ms: u64,

    /// Artifact download timeout in seconds.
    #[arg(long, env = "DOCFERRY_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Exit immediately after the download instead of waiting for the
    /// deferred cleanup call to fire.
    #[arg(long)]
    no_cleanup_wait: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCFERRY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCFERRY_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    PdfToDocx,
    DocxToPdf,
}

impl From<ModeArg> for ConversionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::PdfToDocx => ConversionMode::PdfToDocx,
            ModeArg::DocxToPdf => ConversionMode::DocxToPdf,
        }
    }
}

/// Declare a MIME type from the extension, the way a file picker would.
///
/// Unknown extensions still produce a candidate — validation rejects it
/// with the mode's own message rather than a special CLI error.
fn declared_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => PDF_MIME,
        Some("docx") => DOCX_MIME,
        Some("doc") => DOC_MIME,
        _ => "application/octet-stream",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the user feedback; keep library logs at error
    // unless the user asks for more.
    let filter = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    // ── Build config & controller ────────────────────────────────────────
    let events = (!cli.quiet).then(SpinnerEvents::new);

    let mut builder = WorkflowConfig::builder()
        .service_base_url(cli.service_url.clone())
        .output_dir(&cli.output_dir)
        .cleanup_delay_ms(cli.cleanup_delay_ms)
        .download_timeout_secs(cli.download_timeout);
    if let Some(ref cb) = events {
        builder = builder.event_callback(Arc::clone(cb) as Arc<dyn WorkflowEventCallback>);
    }
    let config = builder.build().context("invalid configuration")?;

    let service =
        Arc::new(HttpConversionService::from_config(&config).context("failed to set up HTTP client")?);
    let mut controller = TransferController::new(service, config);
    controller.set_mode(cli.mode.into());

    // ── Acquire the file (the CLI plays the picker) ──────────────────────
    let content = tokio::fs::read(&cli.input)
        .await
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let name = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let mime = declared_mime(&cli.input);

    let clear_spinner = |events: &Option<Arc<SpinnerEvents>>| {
        if let Some(cb) = events {
            cb.bar.finish_and_clear();
        }
    };

    if let Err(err) = controller.acquire_files(vec![FileCandidate::new(name, mime, content)]) {
        clear_spinner(&events);
        bail!("{err}");
    }

    // ── Submit ───────────────────────────────────────────────────────────
    match controller.submit().await.cloned() {
        Some(ConversionResult::Success { .. }) => {}
        Some(ConversionResult::Failure { message }) => {
            clear_spinner(&events);
            bail!("{message}");
        }
        None => {
            clear_spinner(&events);
            bail!("nothing to submit");
        }
    }

    // ── Download ─────────────────────────────────────────────────────────
    let path = controller
        .download()
        .await
        .context("download failed")?
        .context("no converted file available")?;

    // ── Let the deferred cleanup fire before the runtime goes away ───────
    if !cli.no_cleanup_wait {
        if let Some(ref cb) = events {
            cb.bar.set_message("removing server copy…".to_string());
        }
        tokio::time::sleep(Duration::from_millis(cli.cleanup_delay_ms + 250)).await;
    }
    if let Some(ref cb) = events {
        cb.bar.finish_and_clear();
    }

    if cli.quiet {
        println!("{}", path.display());
    } else {
        eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
    }

    Ok(())
}
