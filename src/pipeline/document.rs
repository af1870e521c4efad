//! HTML document assembly: title, effective stylesheet, rendered body.
//!
//! The stylesheet is picked by precedence: the explicit
//! [`Stylesheet`] of the conversion config, then a `stylesheet` declared in
//! front matter, then the built-in default. Stylesheet files are always read
//! here, so a missing or unreadable file surfaces as
//! [`Md2PdfError::StylesheetUnreadable`] instead of a silently unstyled page.
//!
//! A stylesheet file under the server root is linked by its static path so
//! its relative `url(...)` and `@import` references resolve against its own
//! directory. Everything else (the default, inline CSS, files outside the
//! root) is embedded in a `<style>` element.

use crate::config::Stylesheet;
use crate::error::Md2PdfError;
use crate::output::get_filename;
use crate::pipeline::{frontmatter, markdown};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::borrow::Cow;
use std::path::{Component, Path};
use tracing::debug;

/// Bytes escaped inside one URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Built-in stylesheet used when neither the config nor front matter names one.
pub const DEFAULT_STYLESHEET: &str = include_str!("../../assets/markdown.css");

/// Title used when the source name yields an empty one.
pub const UNTITLED: &str = "Untitled";

/// A complete HTML page ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub title: String,
    pub html: String,
}

/// How the effective stylesheet reaches the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleBlock {
    /// CSS embedded in a `<style>` element.
    Inline(Cow<'static, str>),
    /// Absolute URL path of a stylesheet served from the static root.
    Linked(String),
}

/// Where the effective stylesheet came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleOrigin {
    Explicit,
    FrontMatter,
    Default,
}

/// Read `source`, resolve front matter and stylesheet, and build the page.
///
/// `root` is the canonical static root the page is served from.
pub async fn render_file(
    source: &Path,
    explicit: Option<&Stylesheet>,
    root: &Path,
) -> Result<RenderedDocument, Md2PdfError> {
    let raw = tokio::fs::read(source)
        .await
        .map_err(|e| Md2PdfError::SourceUnreadable {
            path: source.to_path_buf(),
            source: e,
        })?;
    let text = String::from_utf8_lossy(&raw);

    let front = frontmatter::resolve(&text, source);
    let (style, origin) = resolve_stylesheet(explicit, front.stylesheet(), root).await?;
    debug!("Rendering {} with {:?} stylesheet", source.display(), origin);

    let content = markdown::to_html(front.body());
    Ok(render_document(&title_for(source), &style, &content))
}

/// Pick and load the effective stylesheet, linking files that live under
/// `root` (canonical).
pub async fn resolve_stylesheet(
    explicit: Option<&Stylesheet>,
    front_matter: Option<&Path>,
    root: &Path,
) -> Result<(StyleBlock, StyleOrigin), Md2PdfError> {
    match (explicit, front_matter) {
        (Some(Stylesheet::Inline(css)), _) => Ok((
            StyleBlock::Inline(Cow::Owned(css.clone())),
            StyleOrigin::Explicit,
        )),
        (Some(Stylesheet::Path(path)), _) => {
            Ok((load_stylesheet(path, root).await?, StyleOrigin::Explicit))
        }
        (None, Some(path)) => Ok((load_stylesheet(path, root).await?, StyleOrigin::FrontMatter)),
        (None, None) => Ok((
            StyleBlock::Inline(Cow::Borrowed(DEFAULT_STYLESHEET)),
            StyleOrigin::Default,
        )),
    }
}

async fn load_stylesheet(path: &Path, root: &Path) -> Result<StyleBlock, Md2PdfError> {
    let unreadable = |e: std::io::Error| Md2PdfError::StylesheetUnreadable {
        path: path.to_path_buf(),
        source: e,
    };
    let css = tokio::fs::read_to_string(path).await.map_err(unreadable)?;
    let canonical = tokio::fs::canonicalize(path).await.map_err(unreadable)?;

    match canonical.strip_prefix(root).ok().and_then(url_path) {
        Some(href) => Ok(StyleBlock::Linked(href)),
        None => Ok(StyleBlock::Inline(Cow::Owned(css))),
    }
}

/// `/`-rooted, percent-encoded URL path for a root-relative file path.
fn url_path(relative: &Path) -> Option<String> {
    let mut href = String::new();
    for component in relative.components() {
        let Component::Normal(segment) = component else {
            return None;
        };
        href.push('/');
        href.extend(utf8_percent_encode(segment.to_str()?, SEGMENT));
    }
    (!href.is_empty()).then_some(href)
}

/// Page title for `source`: base filename without its final extension.
pub fn title_for(source: &Path) -> String {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let title = get_filename(&name);
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

/// Wrap an HTML fragment into a full page with the given stylesheet.
pub fn render_document(title: &str, style: &StyleBlock, content: &str) -> RenderedDocument {
    let style = match style {
        StyleBlock::Inline(css) => {
            format!("<style>\n{}\n</style>", css.replace("</style", "<\\/style"))
        }
        StyleBlock::Linked(href) => {
            format!("<link rel=\"stylesheet\" href=\"{}\">", escape_html(href))
        }
    };
    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
{style}\n</head>\n<body>\n{content}</body>\n</html>\n",
        title = escape_html(title),
    );
    RenderedDocument {
        title: title.to_string(),
        html,
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
