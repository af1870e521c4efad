//! Input validation: make sure a user-supplied path is a readable regular file.
//!
//! Validation happens once per path before any server or browser is started,
//! so a typo in one of several arguments is reported on its own and the other
//! paths still convert.

use crate::error::Md2PdfError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve a local Markdown path, validating existence and file type.
pub fn validate_input(path: impl AsRef<Path>) -> Result<PathBuf, Md2PdfError> {
    let path = path.as_ref().to_path_buf();

    let meta = match std::fs::metadata(&path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Md2PdfError::PermissionDenied { path });
        }
        Err(_) => return Err(Md2PdfError::FileNotFound { path }),
    };

    if !meta.is_file() {
        return Err(Md2PdfError::NotAFile { path });
    }

    // Check read permission by attempting to open
    if let Err(e) = std::fs::File::open(&path) {
        return Err(if e.kind() == std::io::ErrorKind::PermissionDenied {
            Md2PdfError::PermissionDenied { path }
        } else {
            Md2PdfError::FileNotFound { path }
        });
    }

    debug!("Resolved local Markdown: {}", path.display());
    Ok(path)
}
