//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one step. The HTML side (front matter,
//! markdown, document) is pure and synchronous; the server and the print
//! driver own the two external resources of a conversion, a listening socket
//! and a browser process.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ frontmatter ──▶ markdown ──▶ document ──▶ server ──▶ print
//! (path)    (style ref)     (HTML body)  (title+CSS)  (GET /)    (Chrome)
//! ```
//!
//! 1. [`input`]       check the user-supplied path is an existing regular file
//! 2. [`frontmatter`] split an optional leading YAML block from the body
//! 3. [`markdown`]    render the body to an HTML fragment
//! 4. [`document`]    pick the stylesheet and wrap everything in a page
//! 5. [`server`]      serve that page (and sibling assets) on an ephemeral port
//! 6. [`print`]       load the page in headless Chrome and print it to PDF

pub mod document;
pub mod frontmatter;
pub mod input;
pub mod markdown;
pub mod print;
pub mod server;
