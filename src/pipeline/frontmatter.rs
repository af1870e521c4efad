//! Front-matter resolution: split a leading YAML block from the Markdown body.
//!
//! ```text
//! ---
//! stylesheet: print.css
//! ---
//! # Body starts here
//! ```
//!
//! A document without a well-formed block is not an error. Anything that
//! cannot be split or parsed comes back as [`FrontMatter::Unparsed`] with the
//! original text untouched, so a stray `---` at the top of a file never
//! changes what gets rendered.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Delimiter line opening and closing the block.
const DELIMITER: &str = "---";

/// Key naming a stylesheet relative to the Markdown file.
const STYLESHEET_KEY: &str = "stylesheet";

/// Result of front-matter resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontMatter<'a> {
    /// A YAML block was found and parsed.
    Parsed {
        /// Text after the closing delimiter.
        body: &'a str,
        /// `stylesheet` value resolved against the source file's directory.
        stylesheet: Option<PathBuf>,
    },
    /// No usable block; `body` is the full original text.
    Unparsed { body: &'a str },
}

impl<'a> FrontMatter<'a> {
    /// Markdown to render.
    pub fn body(&self) -> &'a str {
        match self {
            FrontMatter::Parsed { body, .. } | FrontMatter::Unparsed { body } => *body,
        }
    }

    /// Stylesheet declared in the block, if any.
    pub fn stylesheet(&self) -> Option<&Path> {
        match self {
            FrontMatter::Parsed { stylesheet, .. } => stylesheet.as_deref(),
            FrontMatter::Unparsed { .. } => None,
        }
    }
}

/// Resolve the front matter of `text`, read from the file at `source`.
pub fn resolve<'a>(text: &'a str, source: &Path) -> FrontMatter<'a> {
    let Some((yaml, body)) = split_block(text) else {
        return FrontMatter::Unparsed { body: text };
    };

    let value: serde_yaml::Value = match serde_yaml::from_str(yaml) {
        Ok(value @ (serde_yaml::Value::Mapping(_) | serde_yaml::Value::Null)) => value,
        Ok(_) => {
            debug!("Ignoring non-mapping front matter in {}", source.display());
            return FrontMatter::Unparsed { body: text };
        }
        Err(e) => {
            debug!("Ignoring malformed front matter in {}: {}", source.display(), e);
            return FrontMatter::Unparsed { body: text };
        }
    };

    let stylesheet = value
        .get(STYLESHEET_KEY)
        .and_then(serde_yaml::Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(|s| source_dir(source).join(s.trim()));

    FrontMatter::Parsed { body, stylesheet }
}

/// Split `---\n<yaml>\n---\n<body>` into `(yaml, body)`.
fn split_block(text: &str) -> Option<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');

    let opening = lines.next()?;
    if opening.trim_end() != DELIMITER {
        return None;
    }

    let mut offset = opening.len();
    for line in lines {
        if line.trim_end() == DELIMITER {
            let yaml = &text[opening.len()..offset];
            let body = &text[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }

    None
}

fn source_dir(source: &Path) -> &Path {
    match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
