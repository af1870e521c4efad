//! Error types for the md2pdf library.
//!
//! Every fatal failure of a conversion is a [`Md2PdfError`]. Recoverable
//! conditions never reach this type: a front-matter block that fails to parse
//! is treated as ordinary body text (see [`crate::pipeline::frontmatter`]),
//! and a failed conversion inside the watch loop is reported and the loop
//! keeps running.
//!
//! Variants are grouped by the stage that produced them so callers can match
//! on the ones they care about (for example the CLI prints `Not found` and
//! `Is not a file` for the two input variants and keeps going).

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The path exists but is a directory, socket, or other non-regular file.
    #[error("'{path}' is not a regular file")]
    NotAFile { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The source was validated but could not be read when the page was served.
    #[error("Failed to read Markdown source '{path}': {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading piped standard input failed.
    #[error("Failed to read standard input: {0}")]
    StdinRead(#[source] std::io::Error),

    // ── Render errors ─────────────────────────────────────────────────────
    /// A stylesheet requested via option or front matter could not be read.
    ///
    /// This aborts the conversion: printing without the requested styling
    /// would silently produce a different document than the one asked for.
    #[error("Stylesheet '{path}' could not be read: {source}")]
    StylesheetUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Server errors ─────────────────────────────────────────────────────
    /// The local document server could not bind an ephemeral port.
    #[error("Failed to bind local document server: {source}")]
    ServerBind {
        #[source]
        source: std::io::Error,
    },

    // ── Browser errors ────────────────────────────────────────────────────
    /// Chrome/Chromium could not be started or connected to.
    #[error(
        "Failed to launch headless browser: {0}\n\n\
md2pdf prints through a local Chrome or Chromium installation.\n\
  • Install Google Chrome or Chromium.\n\
  • Or point to a binary with --chrome /path/to/chrome (MD2PDF_CHROME).\n\
  • In containers running as root, add --no-sandbox.\n"
    )]
    BrowserLaunch(String),

    /// The browser could not open or navigate to the document URL.
    #[error("Navigation to '{url}' failed: {detail}")]
    Navigation { url: String, detail: String },

    /// The document did not finish loading in time.
    #[error("Page '{url}' did not finish loading within {secs}s\nIncrease --load-timeout.")]
    LoadTimeout { url: String, secs: u64 },

    /// The browser's print-to-PDF command failed.
    #[error("Printing to PDF failed: {0}")]
    PrintFailed(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The private staging directory for in-memory input could not be created.
    #[error("Failed to stage input in a temporary directory: {0}")]
    Staging(#[source] std::io::Error),

    // ── Watch errors ──────────────────────────────────────────────────────
    /// The filesystem watcher could not be created or attached.
    #[error("Failed to watch '{path}': {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    // ── Cancellation ──────────────────────────────────────────────────────
    /// The operation was interrupted (Ctrl-C) after cleanup completed.
    #[error("Interrupted")]
    Interrupted,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Md2PdfError {
    /// `true` for per-path input errors, which the CLI reports and skips.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Md2PdfError::FileNotFound { .. }
                | Md2PdfError::NotAFile { .. }
                | Md2PdfError::PermissionDenied { .. }
        )
    }
}
