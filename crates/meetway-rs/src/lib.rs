//! Public SDK surface for the Meetway widget engine.
//!
//! This crate re-exports the building blocks and provides a small
//! initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use meetway_rs_config as config;
pub use meetway_rs_core as core;
/// Re-export for convenience.
pub use meetway_rs_dom as dom;

use meetway_rs_config::WidgetConfig;
use meetway_rs_core::{CookieJar, WidgetSession};
use meetway_rs_dom::PageSnapshot;
use parking_lot::Mutex;
use std::sync::Arc;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Embedders are still
/// expected to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}

/// Resolve a page in one call: parse the cookie header, snapshot the page,
/// and run both pipelines.
pub async fn init_session(
    config: WidgetConfig,
    url: impl Into<String>,
    html: &str,
    cookie_header: &str,
) -> WidgetSession {
    let page = Arc::new(PageSnapshot::new(url, html));
    let cookies = Arc::new(Mutex::new(CookieJar::parse(cookie_header)));
    WidgetSession::init(config, page, cookies).await
}
