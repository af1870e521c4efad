//! Standard-input ingestion.
//!
//! The document server needs a file on disk, so piped Markdown is buffered in
//! full, staged as `stdin.md` inside a private temporary directory, and then
//! converted like any other source. The directory is removed by
//! [`StagedInput::cleanup`] on every exit path: success, error, and
//! cancellation. Dropping a [`StagedInput`] also cleans up.
//!
//! ```text
//! Buffering ──▶ Staged ──▶ Converting ──▶ Cleaned
//!     │                        │              ▲
//!     └──── cancel ────────────┴──────────────┘
//! ```

use crate::config::ConversionConfig;
use crate::convert::convert_with;
use crate::error::Md2PdfError;
use crate::pipeline::print::{ChromePrinter, Printer};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

/// File name of the staged document inside the temp directory.
pub const STAGED_FILE_NAME: &str = "stdin.md";

/// Convert Markdown read from the process's standard input.
///
/// `cancel` completing at any point aborts the conversion with
/// [`Md2PdfError::Interrupted`], after the staging directory has been removed.
/// The CLI passes a Ctrl-C future here.
pub async fn convert_stdin<C>(config: &ConversionConfig, cancel: C) -> Result<Vec<u8>, Md2PdfError>
where
    C: Future<Output = ()>,
{
    let printer = ChromePrinter::from_config(config);
    convert_reader(tokio::io::stdin(), config, &printer, cancel).await
}

/// Convert in-memory Markdown, with the same staging and cleanup as stdin.
///
/// # Example
/// ```rust,no_run
/// use md2pdf::{convert_from_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pdf = convert_from_bytes(b"# Release notes\n", &ConversionConfig::default()).await?;
/// std::fs::write("notes.pdf", pdf)?;
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    markdown: &[u8],
    config: &ConversionConfig,
) -> Result<Vec<u8>, Md2PdfError> {
    let printer = ChromePrinter::from_config(config);
    convert_reader(markdown, config, &printer, std::future::pending()).await
}

/// Buffer `reader` to the end, stage it, and convert it with `printer`.
pub async fn convert_reader<R, P, C>(
    mut reader: R,
    config: &ConversionConfig,
    printer: &P,
    cancel: C,
) -> Result<Vec<u8>, Md2PdfError>
where
    R: AsyncRead + Unpin,
    P: Printer,
    C: Future<Output = ()>,
{
    tokio::pin!(cancel);

    let mut markdown = Vec::new();
    tokio::select! {
        read = reader.read_to_end(&mut markdown) => {
            read.map_err(Md2PdfError::StdinRead)?;
        }
        _ = &mut cancel => {
            debug!("Interrupted while reading input");
            return Err(Md2PdfError::Interrupted);
        }
    }
    debug!("Buffered {} bytes of Markdown", markdown.len());

    let mut staged = StagedInput::create(&markdown, config.staging_dir.as_deref())?;
    let result = tokio::select! {
        converted = convert_with(staged.path(), config, printer) => converted,
        _ = &mut cancel => {
            debug!("Interrupted while converting staged input");
            Err(Md2PdfError::Interrupted)
        }
    };
    staged.cleanup();
    result
}

/// Markdown persisted in a private temp directory for the duration of one
/// conversion.
#[derive(Debug)]
pub struct StagedInput {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl StagedInput {
    /// Create the directory (under `parent`, or the system temp dir) and
    /// write `markdown` to `stdin.md` inside it.
    pub fn create(markdown: &[u8], parent: Option<&Path>) -> Result<Self, Md2PdfError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("md2pdf-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(Md2PdfError::Staging)?;

        let path = dir.path().join(STAGED_FILE_NAME);
        let mut file = std::fs::File::create(&path).map_err(Md2PdfError::Staging)?;
        file.write_all(markdown).map_err(Md2PdfError::Staging)?;

        debug!("Staged input at {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staging directory. Safe to call more than once.
    pub fn cleanup(&mut self) {
        if let Some(dir) = self.dir.take() {
            let location = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!("Removed {}", location.display()),
                Err(e) => warn!("Failed to remove {}: {}", location.display(), e),
            }
        }
    }

    /// Whether [`cleanup`](Self::cleanup) has already run.
    pub fn is_cleaned(&self) -> bool {
        self.dir.is_none()
    }
}

impl Drop for StagedInput {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingPrinter, FetchingPrinter, PendingPrinter, PDF_MAGIC};
    use std::time::Duration;

    fn staging_config() -> (tempfile::TempDir, ConversionConfig) {
        let parent = tempfile::tempdir().unwrap();
        let config = ConversionConfig::builder()
            .staging_dir(parent.path())
            .root(parent.path())
            .build()
            .unwrap();
        (parent, config)
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn converts_piped_markdown_and_removes_staging_dir() {
        let (parent, config) = staging_config();
        let pdf = convert_reader(&b"# A\n"[..], &config, &FetchingPrinter, std::future::pending())
            .await
            .unwrap();

        assert!(pdf.starts_with(PDF_MAGIC));
        let text = String::from_utf8_lossy(&pdf);
        assert!(text.contains("<h1>A</h1>"));
        assert!(text.contains("<title>stdin</title>"));
        assert_eq!(entries(parent.path()), 0);
    }

    #[tokio::test]
    async fn failed_conversion_still_cleans_up() {
        let (parent, config) = staging_config();
        let err = convert_reader(&b"# A"[..], &config, &FailingPrinter::default(), std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(err, Md2PdfError::PrintFailed(_)));
        assert_eq!(entries(parent.path()), 0);
    }

    #[tokio::test]
    async fn interruption_during_conversion_cleans_up() {
        let (parent, config) = staging_config();
        let cancel = tokio::time::sleep(Duration::from_millis(100));
        let err = convert_reader(&b"# A"[..], &config, &PendingPrinter, cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Md2PdfError::Interrupted));
        assert_eq!(entries(parent.path()), 0);
    }

    #[tokio::test]
    async fn interruption_while_buffering_stages_nothing() {
        let (parent, config) = staging_config();
        let (mut writer, reader) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(&mut writer, b"# partial")
            .await
            .unwrap();

        let cancel = tokio::time::sleep(Duration::from_millis(50));
        let err = convert_reader(reader, &config, &FetchingPrinter, cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Md2PdfError::Interrupted));
        assert_eq!(entries(parent.path()), 0);
        drop(writer);
    }

    #[test]
    fn cleanup_is_idempotent() {
        let parent = tempfile::tempdir().unwrap();
        let mut staged = StagedInput::create(b"# A", Some(parent.path())).unwrap();
        assert_eq!(staged.path().file_name().unwrap(), STAGED_FILE_NAME);
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"# A");

        staged.cleanup();
        assert!(staged.is_cleaned());
        staged.cleanup();
        drop(staged);
        assert_eq!(entries(parent.path()), 0);
    }

    #[test]
    fn drop_removes_directory() {
        let parent = tempfile::tempdir().unwrap();
        let staged = StagedInput::create(b"x", Some(parent.path())).unwrap();
        let dir = staged.path().parent().unwrap().to_path_buf();
        assert!(dir.starts_with(parent.path()));
        assert!(dir.file_name().unwrap().to_string_lossy().starts_with("md2pdf-"));

        drop(staged);
        assert!(!dir.exists());
    }
}
