//! Configuration types for Markdown-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. A config is immutable once built and
//! is shared by reference across every conversion of a run (all inputs, every
//! watch-loop re-conversion, the stdin path).

use crate::error::Md2PdfError;
use crate::progress::Observer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Largest accepted uniform margin: 3 inches at 96 CSS px per inch.
const MAX_MARGIN_PX: f64 = 288.0;

/// Configuration for a Markdown-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use md2pdf::{ConversionConfig, Stylesheet};
///
/// let config = ConversionConfig::builder()
///     .stylesheet(Stylesheet::Path("print.css".into()))
///     .margin_px(48.0)
///     .no_sandbox(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Explicit stylesheet. Overrides a `stylesheet` key in the document's
    /// front matter, which in turn overrides the built-in default.
    pub stylesheet: Option<Stylesheet>,

    /// Directory static requests (`GET /<path>`) are served from.
    /// If None, the process working directory at server launch.
    pub root: Option<PathBuf>,

    /// Uniform page margin on all four sides, in CSS pixels. Default: 36.
    pub margin_px: f64,

    /// Print CSS backgrounds (code block shading, table stripes). Default: true.
    pub print_background: bool,

    /// Chrome/Chromium executable. If None, chromiumoxide auto-detects one.
    pub chrome_executable: Option<PathBuf>,

    /// Launch Chrome with `--no-sandbox` (needed as root in most containers).
    pub no_sandbox: bool,

    /// Seconds to wait for the browser to start. Default: 30.
    pub launch_timeout_secs: u64,

    /// Seconds to wait for `document.readyState == "complete"`. Default: 30.
    pub load_timeout_secs: u64,

    /// Parent directory for the private staging directory used by stdin and
    /// in-memory input. If None, the system temp directory.
    pub staging_dir: Option<PathBuf>,

    /// Per-file event sink. See [`crate::progress`].
    pub observer: Option<Observer>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            stylesheet: None,
            root: None,
            margin_px: 36.0,
            print_background: true,
            chrome_executable: None,
            no_sandbox: false,
            launch_timeout_secs: 30,
            load_timeout_secs: 30,
            staging_dir: None,
            observer: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("stylesheet", &self.stylesheet)
            .field("root", &self.root)
            .field("margin_px", &self.margin_px)
            .field("print_background", &self.print_background)
            .field("chrome_executable", &self.chrome_executable)
            .field("no_sandbox", &self.no_sandbox)
            .field("launch_timeout_secs", &self.launch_timeout_secs)
            .field("load_timeout_secs", &self.load_timeout_secs)
            .field("staging_dir", &self.staging_dir)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn ConversionObserver>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Uniform margin converted to inches, the unit Chrome's printToPDF expects.
    pub fn margin_inches(&self) -> f64 {
        self.margin_px / 96.0
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn stylesheet(mut self, stylesheet: Stylesheet) -> Self {
        self.config.stylesheet = Some(stylesheet);
        self
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = Some(root.into());
        self
    }

    pub fn margin_px(mut self, px: f64) -> Self {
        self.config.margin_px = px;
        self
    }

    pub fn print_background(mut self, v: bool) -> Self {
        self.config.print_background = v;
        self
    }

    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    pub fn no_sandbox(mut self, v: bool) -> Self {
        self.config.no_sandbox = v;
        self
    }

    pub fn launch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.launch_timeout_secs = secs;
        self
    }

    pub fn load_timeout_secs(mut self, secs: u64) -> Self {
        self.config.load_timeout_secs = secs;
        self
    }

    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_dir = Some(dir.into());
        self
    }

    /// Set a per-file event sink.
    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        let c = &self.config;
        if !c.margin_px.is_finite() || c.margin_px < 0.0 || c.margin_px > MAX_MARGIN_PX {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Margin must be 0–{MAX_MARGIN_PX} px, got {}",
                c.margin_px
            )));
        }
        if c.launch_timeout_secs == 0 {
            return Err(Md2PdfError::InvalidConfig(
                "Browser launch timeout must be ≥ 1s".into(),
            ));
        }
        if c.load_timeout_secs == 0 {
            return Err(Md2PdfError::InvalidConfig(
                "Page load timeout must be ≥ 1s".into(),
            ));
        }
        if let Some(Stylesheet::Path(path)) = &c.stylesheet {
            if path.as_os_str().is_empty() {
                return Err(Md2PdfError::InvalidConfig(
                    "Stylesheet path must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// An explicit stylesheet supplied with the conversion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stylesheet {
    /// CSS file on disk. Relative paths resolve against the working directory.
    Path(PathBuf),
    /// CSS text embedded as-is.
    Inline(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_print_geometry() {
        let c = ConversionConfig::default();
        assert_eq!(c.margin_px, 36.0);
        assert!((c.margin_inches() - 0.375).abs() < f64::EPSILON);
        assert!(c.print_background);
        assert!(c.stylesheet.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let c = ConversionConfig::builder()
            .stylesheet(Stylesheet::Inline("body { color: red }".into()))
            .root("/srv/docs")
            .no_sandbox(true)
            .load_timeout_secs(5)
            .build()
            .unwrap();
        assert_eq!(
            c.stylesheet,
            Some(Stylesheet::Inline("body { color: red }".into()))
        );
        assert_eq!(c.root, Some(PathBuf::from("/srv/docs")));
        assert!(c.no_sandbox);
        assert_eq!(c.load_timeout_secs, 5);
    }

    #[test]
    fn builder_rejects_bad_margin() {
        let err = ConversionConfig::builder().margin_px(-1.0).build().unwrap_err();
        assert!(matches!(err, Md2PdfError::InvalidConfig(_)));
        assert!(ConversionConfig::builder().margin_px(f64::NAN).build().is_err());
        assert!(ConversionConfig::builder().margin_px(500.0).build().is_err());
    }

    #[test]
    fn builder_rejects_zero_timeouts() {
        assert!(ConversionConfig::builder().launch_timeout_secs(0).build().is_err());
        assert!(ConversionConfig::builder().load_timeout_secs(0).build().is_err());
    }

    #[test]
    fn builder_rejects_empty_stylesheet_path() {
        let err = ConversionConfig::builder()
            .stylesheet(Stylesheet::Path(PathBuf::new()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Stylesheet"));
    }

    #[test]
    fn debug_hides_observer() {
        let c = ConversionConfig::builder()
            .observer(std::sync::Arc::new(crate::progress::NoopObserver))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn ConversionObserver>"));
    }
}
