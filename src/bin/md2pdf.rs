//! CLI binary for md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and reports per-file results.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use md2pdf::{
    convert_stdin, convert_to_file, output_path, validate_input, ConversionConfig,
    ConversionObserver, Md2PdfError, Stylesheet, WatchLoop,
};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Conventional exit status after SIGINT.
const EXIT_INTERRUPTED: u8 = 130;
/// No usable input among the given paths.
const EXIT_USAGE: u8 = 2;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn underline(s: &str) -> String {
    format!("\x1b[4m{s}\x1b[0m")
}
fn bg_blue(s: &str) -> String {
    format!("\x1b[44m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Shows a spinner while a file converts and a result line when it is done.
struct CliObserver {
    spinner: bool,
    quiet: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl CliObserver {
    fn new(spinner: bool, quiet: bool) -> Arc<Self> {
        Arc::new(Self {
            spinner,
            quiet,
            bar: Mutex::new(None),
        })
    }

    fn clear(&self) {
        if let Some(bar) = self.bar.lock().ok().and_then(|mut b| b.take()) {
            bar.finish_and_clear();
        }
    }
}

impl ConversionObserver for CliObserver {
    fn on_conversion_start(&self, source: &Path) {
        if !self.spinner {
            return;
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.yellow} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(format!("generating PDF from {}", underline(&source.display().to_string())));
        bar.enable_steady_tick(Duration::from_millis(50));
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn on_conversion_complete(&self, _source: &Path, output: &Path, _pdf_len: usize) {
        self.clear();
        if !self.quiet {
            eprintln!(
                "{} generated {}",
                green("✔"),
                underline(&output.display().to_string())
            );
        }
    }

    fn on_conversion_error(&self, source: &Path, error: &Md2PdfError) {
        self.clear();
        eprintln!("{} md2pdf: {}: {}", red("✘"), source.display(), error);
    }
}

/// A simple CLI tool for converting markdown to PDF.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "A simple CLI tool for converting markdown to PDF",
    long_about = "Convert Markdown files to PDF by rendering them to HTML and printing the page \
with headless Chrome. Each FILE is written next to itself with a .pdf extension. With no FILE \
and piped input, the Markdown is read from stdin and the PDF written to stdout.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown files to convert.
    files: Vec<PathBuf>,

    /// Watch for file changes and regenerate.
    #[arg(short, long, env = "MD2PDF_WATCH")]
    watch: bool,

    /// Set CSS file used for rendering (overrides front matter).
    #[arg(long, env = "MD2PDF_CSS", value_name = "FILE")]
    css: Option<PathBuf>,

    /// Chrome/Chromium executable. Auto-detected when unset.
    #[arg(long, env = "MD2PDF_CHROME", value_name = "PATH")]
    chrome: Option<PathBuf>,

    /// Launch Chrome without its sandbox (needed as root in containers).
    #[arg(long, env = "MD2PDF_NO_SANDBOX")]
    no_sandbox: bool,

    /// Uniform page margin in CSS pixels (0–288).
    #[arg(long, env = "MD2PDF_MARGIN", default_value_t = 36.0)]
    margin: f64,

    /// Seconds to wait for the page to finish loading.
    #[arg(long, env = "MD2PDF_LOAD_TIMEOUT", default_value_t = 30)]
    load_timeout: u64,

    /// Seconds to wait for the browser to start.
    #[arg(long, env = "MD2PDF_LAUNCH_TIMEOUT", default_value_t = 30)]
    launch_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one file (writes notes.pdf)
  md2pdf notes.md

  # Several files, then regenerate on every save
  md2pdf -w intro.md chapter1.md

  # Custom stylesheet
  md2pdf --css print.css notes.md

  # From stdin to stdout
  cat notes.md | md2pdf > notes.pdf

FRONT MATTER:
  ---
  stylesheet: print.css     # resolved relative to the Markdown file
  ---

  --css wins over front matter, which wins over the built-in stylesheet.

ENVIRONMENT VARIABLES:
  RUST_LOG          Override log filter (e.g. md2pdf=debug)
  MD2PDF_CHROME     Chrome/Chromium executable
  MD2PDF_CSS        Default stylesheet
"#;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let stdin_mode = cli.files.is_empty() && !io::stdin().is_terminal();
    if cli.files.is_empty() && !stdin_mode {
        print_help()?;
        return Ok(ExitCode::SUCCESS);
    }

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; the
    // spinner and result lines are all the feedback that matters.
    let show_spinner = !cli.quiet && !stdin_mode && io::stderr().is_terminal();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_spinner {
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

    // ── Stdin mode ───────────────────────────────────────────────────────
    if stdin_mode {
        let config = build_config(&cli, None)?;
        return match convert_stdin(&config, interrupt_signal()).await {
            Ok(pdf) => {
                let mut out = io::stdout().lock();
                out.write_all(&pdf).context("Failed to write PDF to stdout")?;
                out.flush().context("Failed to write PDF to stdout")?;
                Ok(ExitCode::SUCCESS)
            }
            Err(Md2PdfError::Interrupted) => {
                eprintln!("md2pdf: interrupted");
                let _ = io::stderr().flush();
                // Staging is already cleaned up. Returning would park the
                // runtime shutdown on the blocking stdin read until the writer
                // closes the pipe.
                std::process::exit(i32::from(EXIT_INTERRUPTED));
            }
            Err(e) => Err(e).context("Conversion failed"),
        };
    }

    // ── Validate inputs ──────────────────────────────────────────────────
    let mut paths = Vec::new();
    for file in &cli.files {
        match validate_input(file) {
            Ok(path) => paths.push(path),
            Err(e) if e.is_input_error() => {
                eprintln!("md2pdf: {}: {}", file.display(), input_problem(&e))
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to check {}", file.display())),
        }
    }
    if paths.is_empty() {
        print_help()?;
        return Ok(ExitCode::from(EXIT_USAGE));
    }

    let observer = CliObserver::new(show_spinner, cli.quiet);
    let config = build_config(&cli, Some(observer))?;

    // Start watching before the first conversion so edits made while it
    // runs are not missed.
    let mut watch = if cli.watch {
        Some(WatchLoop::new(&paths, config.clone()).context("Failed to watch input files")?)
    } else {
        None
    };

    // ── Initial conversions ──────────────────────────────────────────────
    let mut failed = 0usize;
    for path in &paths {
        // Failures are reported by the observer.
        if convert_to_file(path, output_path(path), &config).await.is_err() {
            failed += 1;
        }
    }

    // ── Watch mode ───────────────────────────────────────────────────────
    if let Some(watch) = watch.as_mut() {
        if !cli.quiet {
            eprintln!("\n{}\n", bg_blue(" watching for changes "));
        }
        watch.run().await.context("Watch loop failed")?;
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Short per-path message for a rejected input.
fn input_problem(error: &Md2PdfError) -> String {
    match error {
        Md2PdfError::NotAFile { .. } => "Is not a file".to_string(),
        Md2PdfError::FileNotFound { .. } => "Not found".to_string(),
        other => other.to_string(),
    }
}

fn print_help() -> Result<()> {
    Cli::command().print_help().context("Failed to print help")?;
    println!();
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, observer: Option<Arc<CliObserver>>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .margin_px(cli.margin)
        .no_sandbox(cli.no_sandbox)
        .load_timeout_secs(cli.load_timeout)
        .launch_timeout_secs(cli.launch_timeout);

    if let Some(ref css) = cli.css {
        builder = builder.stylesheet(Stylesheet::Path(css.clone()));
    }
    if let Some(ref chrome) = cli.chrome {
        builder = builder.chrome_executable(chrome);
    }
    if let Some(observer) = observer {
        builder = builder.observer(observer);
    }

    builder.build().context("Invalid configuration")
}

/// Resolves on Ctrl-C (and Ctrl-Break on Windows). Never resolves if the
/// handler cannot be installed.
async fn interrupt_signal() {
    #[cfg(windows)]
    {
        let ctrl_break = async {
            match tokio::signal::windows::ctrl_break() {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(_) => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if res.is_err() {
                    std::future::pending::<()>().await;
                }
            }
            _ = ctrl_break => {}
        }
    }
    #[cfg(not(windows))]
    {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
