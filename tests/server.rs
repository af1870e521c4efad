//! Document server over real HTTP. No browser required.

use md2pdf::pipeline::server::DocumentServer;
use md2pdf::{ConversionConfig, Md2PdfError, Stylesheet};
use std::path::PathBuf;

struct Site {
    _dir: tempfile::TempDir,
    root: PathBuf,
    source: PathBuf,
}

fn site(markdown: &str) -> Site {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    std::fs::create_dir(root.join("assets")).unwrap();
    std::fs::write(root.join("assets/site.css"), "h1 { color: teal }").unwrap();
    std::fs::write(root.join("assets/logo.svg"), "<svg/>").unwrap();
    let source = root.join("guide.md");
    std::fs::write(&source, markdown).unwrap();
    Site {
        _dir: dir,
        root,
        source,
    }
}

fn config(site: &Site) -> ConversionConfig {
    ConversionConfig::builder().root(&site.root).build().unwrap()
}

#[tokio::test]
async fn root_serves_rendered_document() {
    let site = site("# Guide\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
    let server = DocumentServer::launch(&site.source, &config(&site)).await.unwrap();

    let resp = reqwest::get(server.url()).await.unwrap();
    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"), "got: {content_type}");

    let html = resp.text().await.unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>guide</title>"));
    assert!(html.contains("<h1>Guide</h1>"));
    assert!(html.contains("<table>"));
    assert!(html.contains("box-sizing: border-box"), "default stylesheet missing");

    assert!(server.take_render_error().is_none());
    server.shutdown().await;
}

#[tokio::test]
async fn root_is_rendered_per_request() {
    let site = site("# First\n");
    let server = DocumentServer::launch(&site.source, &config(&site)).await.unwrap();

    let first = reqwest::get(server.url()).await.unwrap().text().await.unwrap();
    std::fs::write(&site.source, "# Second\n").unwrap();
    let second = reqwest::get(server.url()).await.unwrap().text().await.unwrap();

    assert!(first.contains("<h1>First</h1>"));
    assert!(second.contains("<h1>Second</h1>"));
    server.shutdown().await;
}

#[tokio::test]
async fn front_matter_stylesheet_is_linked() {
    let site = site("---\nstylesheet: assets/site.css\n---\n# Styled\n");
    let server = DocumentServer::launch(&site.source, &config(&site)).await.unwrap();

    let html = reqwest::get(server.url()).await.unwrap().text().await.unwrap();
    assert!(html.contains("<link rel=\"stylesheet\" href=\"/assets/site.css\">"));
    assert!(!html.contains("stylesheet:"));
    server.shutdown().await;
}

#[tokio::test]
async fn linked_stylesheet_keeps_its_relative_base() {
    let site = site("# Fonts\n");
    let theme = site.root.join("docs/theme");
    std::fs::create_dir_all(theme.join("fonts")).unwrap();
    std::fs::write(theme.join("print.css"), "@font-face { src: url(fonts/x.woff) }").unwrap();
    std::fs::write(theme.join("fonts/x.woff"), b"wOFF").unwrap();
    let config = ConversionConfig::builder()
        .root(&site.root)
        .stylesheet(Stylesheet::Path(theme.join("print.css")))
        .build()
        .unwrap();
    let server = DocumentServer::launch(&site.source, &config).await.unwrap();

    let html = reqwest::get(server.url()).await.unwrap().text().await.unwrap();
    assert!(!html.contains("url(fonts/x.woff)"), "stylesheet was inlined");
    let href = html
        .split("<link rel=\"stylesheet\" href=\"")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .expect("stylesheet link");
    assert_eq!(href, "/docs/theme/print.css");

    // What the browser does with `url(fonts/x.woff)` inside the linked sheet.
    let base = reqwest::Url::parse(&server.url()).unwrap().join(href).unwrap();
    let font = base.join("fonts/x.woff").unwrap();
    let resp = reqwest::get(font).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"wOFF");
    server.shutdown().await;
}

#[tokio::test]
async fn stylesheet_outside_root_is_inlined() {
    let site = site("# Plain\n");
    let elsewhere = tempfile::tempdir().unwrap();
    std::fs::write(elsewhere.path().join("out.css"), "h1 { color: plum }").unwrap();
    let config = ConversionConfig::builder()
        .root(&site.root)
        .stylesheet(Stylesheet::Path(elsewhere.path().join("out.css")))
        .build()
        .unwrap();
    let server = DocumentServer::launch(&site.source, &config).await.unwrap();

    let html = reqwest::get(server.url()).await.unwrap().text().await.unwrap();
    assert!(html.contains("<style>\nh1 { color: plum }\n</style>"));
    assert!(!html.contains("<link"));
    server.shutdown().await;
}

#[tokio::test]
async fn unreadable_stylesheet_is_reported() {
    let site = site("# Plain\n");
    let config = ConversionConfig::builder()
        .root(&site.root)
        .stylesheet(Stylesheet::Path(site.root.join("missing.css")))
        .build()
        .unwrap();
    let server = DocumentServer::launch(&site.source, &config).await.unwrap();

    let resp = reqwest::get(server.url()).await.unwrap();
    assert_eq!(resp.status(), 500);
    let err = server.take_render_error().expect("render error recorded");
    assert!(matches!(err, Md2PdfError::StylesheetUnreadable { .. }));
    assert!(server.take_render_error().is_none());
    server.shutdown().await;
}

#[tokio::test]
async fn static_files_are_served_with_mime_type() {
    let site = site("# Guide\n");
    let server = DocumentServer::launch(&site.source, &config(&site)).await.unwrap();

    let resp = reqwest::get(format!("{}assets/site.css", server.url())).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "text/css");
    assert_eq!(resp.text().await.unwrap(), "h1 { color: teal }");

    let resp = reqwest::get(format!("{}assets/logo.svg", server.url())).await.unwrap();
    assert_eq!(resp.headers()["content-type"], "image/svg+xml");
    server.shutdown().await;
}

#[tokio::test]
async fn missing_files_directories_and_traversal_are_404() {
    let site = site("# Guide\n");
    let server = DocumentServer::launch(&site.source, &config(&site)).await.unwrap();
    let base = server.url();

    for path in ["nope.png", "assets", "assets/", "%2e%2e/etc/passwd", "assets/%2e%2e/%2e%2e/x"] {
        let resp = reqwest::get(format!("{base}{path}")).await.unwrap();
        assert_eq!(resp.status(), 404, "path {path}");
        assert_eq!(resp.text().await.unwrap(), "Not Found");
    }
    server.shutdown().await;
}

#[tokio::test]
async fn listener_is_closed_after_shutdown() {
    let site = site("# Guide\n");
    let server = DocumentServer::launch(&site.source, &config(&site)).await.unwrap();
    let url = server.url();
    assert!(reqwest::get(&url).await.is_ok());

    server.shutdown().await;
    assert!(reqwest::get(&url).await.is_err());
}

#[tokio::test]
async fn dropped_handle_stops_serving() {
    let site = site("# Guide\n");
    let server = DocumentServer::launch(&site.source, &config(&site)).await.unwrap();
    let addr = server.addr();
    drop(server);
    tokio::task::yield_now().await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}
