//! Read-only snapshot of the host page the widget is embedded in.

use crate::document::Document;
use log::debug;

/// Captured page state handed to the resolution engine at startup.
///
/// The engine only ever reads from a snapshot; nothing in the pipeline
/// mutates the page.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    url: String,
    document: Document,
}

impl PageSnapshot {
    /// Capture a snapshot from the page URL and its markup.
    pub fn new(url: impl Into<String>, html: &str) -> Self {
        let url = url.into();
        debug!("captured page snapshot (url={url}, html_len={})", html.len());
        Self {
            url,
            document: Document::parse(html),
        }
    }

    /// Snapshot with no markup, for hosts that only supply a URL.
    pub fn empty(url: impl Into<String>) -> Self {
        Self::new(url, "")
    }

    /// Page URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Document `<title>` text, or empty when absent.
    pub fn title(&self) -> String {
        self.document.title().unwrap_or_default()
    }

    /// Parsed document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}
