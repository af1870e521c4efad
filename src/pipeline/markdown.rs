//! Markdown → HTML fragment.
//!
//! GitHub-flavoured extensions (tables, footnotes, strikethrough, task lists)
//! are enabled. Raw HTML passes through unchanged, and fenced code keeps its
//! `language-*` class so a user stylesheet can target it.

use pulldown_cmark::{html, Options, Parser};

/// Render Markdown to an HTML fragment (no `<html>`/`<body>` wrapper).
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
