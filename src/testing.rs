//! Browser-free [`Printer`] doubles shared by unit tests.

use crate::error::Md2PdfError;
use crate::pipeline::print::Printer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Fetches the served document and returns it behind a PDF header.
pub struct FetchingPrinter;

impl Printer for FetchingPrinter {
    async fn print(&self, url: &str) -> Result<Vec<u8>, Md2PdfError> {
        fetch_as_pdf(url).await
    }
}

async fn fetch_as_pdf(url: &str) -> Result<Vec<u8>, Md2PdfError> {
    // A 500 from the server still "prints", like a real browser would.
    let resp = reqwest::get(url)
        .await
        .map_err(|e| Md2PdfError::Navigation {
            url: url.to_string(),
            detail: e.to_string(),
        })?;
    let html = resp.text().await.unwrap_or_default();
    let mut pdf = b"%PDF-1.7\n".to_vec();
    pdf.extend_from_slice(html.as_bytes());
    Ok(pdf)
}

/// [`FetchingPrinter`] that counts calls and remembers the last URL.
#[derive(Default)]
pub struct CountingPrinter {
    calls: AtomicUsize,
    last_url: Mutex<Option<String>>,
}

impl CountingPrinter {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<String> {
        self.last_url.lock().unwrap().clone()
    }
}

impl Printer for CountingPrinter {
    async fn print(&self, url: &str) -> Result<Vec<u8>, Md2PdfError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(url.to_string());
        fetch_as_pdf(url).await
    }
}

/// Always fails, after recording the URL it was given.
#[derive(Default)]
pub struct FailingPrinter {
    last_url: Mutex<Option<String>>,
}

impl FailingPrinter {
    pub fn last_url(&self) -> Option<String> {
        self.last_url.lock().unwrap().clone()
    }
}

impl Printer for FailingPrinter {
    async fn print(&self, url: &str) -> Result<Vec<u8>, Md2PdfError> {
        *self.last_url.lock().unwrap() = Some(url.to_string());
        Err(Md2PdfError::PrintFailed("printer on fire".into()))
    }
}

/// Never finishes. Used to exercise cancellation.
pub struct PendingPrinter;

impl Printer for PendingPrinter {
    async fn print(&self, _url: &str) -> Result<Vec<u8>, Md2PdfError> {
        std::future::pending().await
    }
}
