//! Print driver: load a served document in headless Chrome and print it.
//!
//! The browser is a per-call resource. [`ChromePrinter::print`] launches it,
//! navigates, waits for `document.readyState == "complete"`, prints an A4 PDF
//! and closes the browser on every path, including failures. Every launch gets
//! its own throwaway profile directory, so concurrent runs never attach to one
//! another's browser.

use crate::config::ConversionConfig;
use crate::error::Md2PdfError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A4 width in inches.
pub const A4_WIDTH_IN: f64 = 8.27;
/// A4 height in inches.
pub const A4_HEIGHT_IN: f64 = 11.69;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Turns a document URL into PDF bytes.
///
/// [`ChromePrinter`] is the production implementation; the seam exists so the
/// orchestrator, stdin and watch paths can be exercised without a browser.
pub trait Printer: Send + Sync {
    fn print(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, Md2PdfError>> + Send;
}

impl<P: Printer> Printer for Arc<P> {
    fn print(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, Md2PdfError>> + Send {
        (**self).print(url)
    }
}

/// Page geometry and browser settings for printing.
#[derive(Debug, Clone)]
pub struct ChromePrinter {
    chrome_executable: Option<PathBuf>,
    no_sandbox: bool,
    launch_timeout: Duration,
    load_timeout: Duration,
    margin_inches: f64,
    print_background: bool,
}

impl ChromePrinter {
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            chrome_executable: config.chrome_executable.clone(),
            no_sandbox: config.no_sandbox,
            launch_timeout: Duration::from_secs(config.launch_timeout_secs),
            load_timeout: Duration::from_secs(config.load_timeout_secs),
            margin_inches: config.margin_inches(),
            print_background: config.print_background,
        }
    }

    fn pdf_params(&self) -> PrintToPdfParams {
        PrintToPdfParams {
            print_background: Some(self.print_background),
            paper_width: Some(A4_WIDTH_IN),
            paper_height: Some(A4_HEIGHT_IN),
            margin_top: Some(self.margin_inches),
            margin_bottom: Some(self.margin_inches),
            margin_left: Some(self.margin_inches),
            margin_right: Some(self.margin_inches),
            prefer_css_page_size: Some(false),
            ..Default::default()
        }
    }
}

impl Printer for ChromePrinter {
    async fn print(&self, url: &str) -> Result<Vec<u8>, Md2PdfError> {
        let session = BrowserSession::launch(self).await?;
        let result = session.print_page(self, url).await;
        session.close().await;
        result
    }
}

/// One headless browser process, its CDP event handler task and its profile.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    profile: TempDir,
}

impl BrowserSession {
    async fn launch(printer: &ChromePrinter) -> Result<Self, Md2PdfError> {
        let profile = tempfile::Builder::new()
            .prefix("md2pdf-profile-")
            .tempdir()
            .map_err(|e| Md2PdfError::BrowserLaunch(format!("cannot create profile directory: {e}")))?;

        let mut builder = BrowserConfig::builder()
            .launch_timeout(printer.launch_timeout)
            .user_data_dir(profile.path());
        if let Some(exe) = &printer.chrome_executable {
            builder = builder.chrome_executable(exe);
        }
        if printer.no_sandbox {
            builder = builder.no_sandbox();
        }
        let browser_config = builder.build().map_err(Md2PdfError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| Md2PdfError::BrowserLaunch(e.to_string()))?;

        // The CDP connection only makes progress while the handler is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler: {}", e);
                }
            }
        });

        debug!("Launched headless browser with profile {}", profile.path().display());
        Ok(Self {
            browser,
            handler,
            profile,
        })
    }

    async fn print_page(&self, printer: &ChromePrinter, url: &str) -> Result<Vec<u8>, Md2PdfError> {
        let navigation_err = |e: chromiumoxide::error::CdpError| Md2PdfError::Navigation {
            url: url.to_string(),
            detail: e.to_string(),
        };

        let page = self.browser.new_page("about:blank").await.map_err(navigation_err)?;
        page.goto(url).await.map_err(navigation_err)?;

        tokio::time::timeout(printer.load_timeout, wait_until_complete(&page, url))
            .await
            .map_err(|_| Md2PdfError::LoadTimeout {
                url: url.to_string(),
                secs: printer.load_timeout.as_secs(),
            })??;
        debug!("{} finished loading", url);

        let pdf = page
            .pdf(printer.pdf_params())
            .await
            .map_err(|e| Md2PdfError::PrintFailed(e.to_string()))?;
        if pdf.is_empty() {
            return Err(Md2PdfError::PrintFailed("browser returned an empty PDF".into()));
        }

        if let Err(e) = page.close().await {
            debug!("Closing page failed: {}", e);
        }
        Ok(pdf)
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser did not close cleanly ({}), killing it", e);
            if let Some(Err(e)) = self.browser.kill().await {
                warn!("Failed to kill browser: {}", e);
            }
        }
        match tokio::time::timeout(CLOSE_TIMEOUT, self.browser.wait()).await {
            Ok(Ok(_)) => debug!("Browser exited"),
            Ok(Err(e)) => warn!("Waiting for browser exit failed: {}", e),
            Err(_) => warn!("Browser did not exit within {:?}", CLOSE_TIMEOUT),
        }
        self.handler.abort();
        if let Err(e) = self.profile.close() {
            debug!("Removing browser profile failed: {}", e);
        }
    }
}

async fn wait_until_complete(page: &Page, url: &str) -> Result<(), Md2PdfError> {
    loop {
        let state = page
            .evaluate("document.readyState")
            .await
            .map_err(|e| Md2PdfError::Navigation {
                url: url.to_string(),
                detail: e.to_string(),
            })?
            .into_value::<String>()
            .unwrap_or_default();
        if state == "complete" {
            return Ok(());
        }
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
}
