//! Conversion entry points.
//!
//! A conversion owns two resources for its whole duration: the local
//! document server and the browser that prints from it. Both are acquired and
//! released here, in order: server listening before navigation, browser gone
//! before the server stops. A print failure is returned only after the server
//! has been shut down.

use crate::config::ConversionConfig;
use crate::error::Md2PdfError;
use crate::output::write_pdf;
use crate::pipeline::input::validate_input;
use crate::pipeline::print::{ChromePrinter, Printer};
use crate::pipeline::server::DocumentServer;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a Markdown file to PDF bytes using headless Chrome.
///
/// This is the primary entry point for the library. Nothing is written to
/// disk; see [`convert_to_file`] for that.
///
/// # Errors
/// - `FileNotFound` / `NotAFile` / `PermissionDenied` for a bad `source`
/// - `StylesheetUnreadable` when the effective stylesheet cannot be read
/// - `ServerBind`, `BrowserLaunch`, `Navigation`, `LoadTimeout`, `PrintFailed`
///   for the server and browser stages
pub async fn convert(
    source: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<Vec<u8>, Md2PdfError> {
    convert_with(source, config, &ChromePrinter::from_config(config)).await
}

/// Like [`convert`], with a caller-supplied [`Printer`].
pub async fn convert_with<P: Printer>(
    source: impl AsRef<Path>,
    config: &ConversionConfig,
    printer: &P,
) -> Result<Vec<u8>, Md2PdfError> {
    let start = Instant::now();
    let source = validate_input(source)?;
    info!("Converting {}", source.display());

    let server = DocumentServer::launch(&source, config).await?;
    let printed = printer.print(&server.url()).await;
    let render_error = server.take_render_error();
    server.shutdown().await;

    // The browser happily prints an error page; the server knows better.
    if let Some(e) = render_error {
        return Err(e);
    }
    let pdf = printed?;

    info!(
        "Converted {} ({} bytes, {}ms)",
        source.display(),
        pdf.len(),
        start.elapsed().as_millis()
    );
    Ok(pdf)
}

/// Convert a Markdown file and write the PDF to `output`.
///
/// Uses atomic write (temp file + rename) to prevent partial files. Returns
/// the number of bytes written.
pub async fn convert_to_file(
    source: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<usize, Md2PdfError> {
    convert_to_file_with(source, output, config, &ChromePrinter::from_config(config)).await
}

/// Like [`convert_to_file`], with a caller-supplied [`Printer`].
///
/// This is where observer events fire: start before the server is launched,
/// then exactly one of complete or error.
pub async fn convert_to_file_with<P: Printer>(
    source: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
    printer: &P,
) -> Result<usize, Md2PdfError> {
    let source = source.as_ref();
    let output = output.as_ref();

    if let Some(ref cb) = config.observer {
        cb.on_conversion_start(source);
    }

    let result = async {
        let pdf = convert_with(source, config, printer).await?;
        write_pdf(output, &pdf).await?;
        Ok::<_, Md2PdfError>(pdf.len())
    }
    .await;

    match &result {
        Ok(len) => {
            debug!("{} -> {}", source.display(), output.display());
            if let Some(ref cb) = config.observer {
                cb.on_conversion_complete(source, output, *len);
            }
        }
        Err(e) => {
            if let Some(ref cb) = config.observer {
                cb.on_conversion_error(source, e);
            }
        }
    }
    result
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally. Must not be called from
/// inside an async context.
pub fn convert_sync(
    source: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<Vec<u8>, Md2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(source, config))
}
