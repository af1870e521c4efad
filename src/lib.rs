//! # md2pdf
//!
//! Convert Markdown documents to PDF by printing them from headless Chrome.
//!
//! ## Pipeline Overview
//!
//! ```text
//! notes.md
//!  │
//!  ├─ 1. Input        check the path is a readable regular file
//!  ├─ 2. Front matter optional YAML block, `stylesheet:` key
//!  ├─ 3. Markdown     GitHub-flavoured HTML via pulldown-cmark
//!  ├─ 4. Document     title + inline stylesheet + body
//!  ├─ 5. Server       GET / on 127.0.0.1:<ephemeral>, sibling assets alongside
//!  ├─ 6. Print        Chrome loads the page, waits for readyState, printToPDF
//!  └─ 7. Output       notes.pdf next to the source (or stdout for piped input)
//! ```
//!
//! The server and the browser live exactly as long as one conversion.
//! Stylesheet precedence is: explicit [`Stylesheet`] > front matter >
//! built-in default.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2pdf::{convert_to_file, output_path, ConversionConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Path::new("notes.md");
//!     let config = ConversionConfig::default();
//!     let bytes = convert_to_file(source, output_path(source), &config).await?;
//!     eprintln!("wrote {bytes} bytes");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! md2pdf = { version = "0.3", default-features = false }
//! ```
//!
//! ## Browser
//!
//! A Chrome or Chromium install is required at runtime. It is auto-detected;
//! set [`ConversionConfig::chrome_executable`] to pick one explicitly. In
//! containers running as root, enable [`ConversionConfig::no_sandbox`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stdin;
pub mod watch;

#[cfg(test)]
mod testing;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, Stylesheet};
pub use convert::{convert, convert_sync, convert_to_file, convert_to_file_with, convert_with};
pub use error::Md2PdfError;
pub use output::{get_filename, output_path, write_pdf};
pub use pipeline::input::validate_input;
pub use pipeline::print::{ChromePrinter, Printer};
pub use progress::{ConversionObserver, NoopObserver, Observer};
pub use stdin::{convert_from_bytes, convert_reader, convert_stdin};
pub use watch::{WatchLoop, WatchState};
