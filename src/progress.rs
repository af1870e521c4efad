//! Observer trait for per-file conversion events.
//!
//! Inject an [`Arc<dyn ConversionObserver>`] via
//! [`crate::config::ConversionConfigBuilder::observer`] to be told when a file
//! starts converting, when its PDF has been written, and when it failed.
//! Events are emitted by [`crate::convert::convert_to_file`] and therefore
//! also by every re-conversion of the watch loop.
//!
//! # Example
//!
//! ```rust
//! use md2pdf::{ConversionConfig, ConversionObserver};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     written: AtomicUsize,
//! }
//!
//! impl ConversionObserver for CountingObserver {
//!     fn on_conversion_complete(&self, source: &Path, output: &Path, pdf_len: usize) {
//!         let n = self.written.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("#{n}: {} → {} ({pdf_len} bytes)", source.display(), output.display());
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver { written: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .observer(observer as Arc<dyn ConversionObserver>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

use crate::error::Md2PdfError;

/// Called by the conversion entry points as each file is processed.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionObserver: Send + Sync {
    /// Called before the document server is started for `source`.
    fn on_conversion_start(&self, source: &Path) {
        let _ = source;
    }

    /// Called after the PDF for `source` has been written to `output`.
    fn on_conversion_complete(&self, source: &Path, output: &Path, pdf_len: usize) {
        let _ = (source, output, pdf_len);
    }

    /// Called when converting `source` failed. All resources have already
    /// been released when this fires.
    fn on_conversion_error(&self, source: &Path, error: &Md2PdfError) {
        let _ = (source, error);
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopObserver;

impl ConversionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type Observer = Arc<dyn ConversionObserver>;
