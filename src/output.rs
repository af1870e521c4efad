//! Output naming and writing.
//!
//! A converted `notes.md` lands next to its source as `notes.pdf`. Only the
//! final extension is replaced, so `archive.tar.md` becomes `archive.tar.pdf`.

use crate::error::Md2PdfError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Get a filename without its final extension from a path string.
///
/// Everything up to the last path separator is dropped, then the last
/// `.`-separated segment is removed. A name without any `.` therefore
/// yields an empty string.
///
/// ```rust
/// use md2pdf::get_filename;
///
/// assert_eq!(get_filename("README.md"), "README");
/// assert_eq!(get_filename("../docs/README.md"), "README");
/// assert_eq!(get_filename("archive.tar.gz"), "archive.tar");
/// assert_eq!(get_filename("noext"), "");
/// ```
pub fn get_filename(path: &str) -> String {
    let base = path
        .rsplit(|c: char| c == '/' || c == std::path::MAIN_SEPARATOR)
        .next()
        .unwrap_or(path);
    let mut segments: Vec<&str> = base.split('.').collect();
    segments.pop();
    segments.join(".")
}

/// The PDF path written for `source`: same directory, final extension
/// replaced by `.pdf`.
///
/// A source without an extension keeps its full name (`notes` → `notes.pdf`)
/// rather than producing a hidden `.pdf` file.
pub fn output_path(source: &Path) -> PathBuf {
    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = get_filename(&base);
    let stem = if stem.is_empty() { base } else { stem };
    source.with_file_name(format!("{stem}.pdf"))
}

/// Write PDF bytes to `path`.
///
/// Uses atomic write (temp file + rename) so a watcher or PDF viewer never
/// sees a half-written file when an existing output is overwritten.
pub async fn write_pdf(path: &Path, pdf: &[u8]) -> Result<(), Md2PdfError> {
    let write_err = |source| Md2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, pdf).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }

    debug!("Wrote {} bytes to {}", pdf.len(), path.display());
    Ok(())
}
