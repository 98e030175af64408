//! Information providers: one strategy each for producing a canonical
//! record, tried in priority order by the resolution pipeline.

mod cache;
mod cookie;
mod dom;
mod fallback;
mod manual;

pub use cache::CacheProvider;
pub use cookie::CookieProvider;
pub use dom::DomProvider;
pub use fallback::FallbackProvider;
pub use manual::ManualProvider;

use crate::record::{Record, Source};
use crate::schema::{PageValue, RecordSchema};
use crate::store::StoreError;
use async_trait::async_trait;
use meetway_rs_dom::PageSnapshot;
use thiserror::Error;

/// Errors surfaced by providers. The pipeline catches and logs these;
/// they never propagate to the caller.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[async_trait]
/// One lookup strategy capable of producing a canonical record.
///
/// `resolve` is async purely for interface uniformity with a future
/// network-backed provider; every concrete provider here completes
/// synchronously.
pub trait InfoProvider: Send + Sync {
    /// Source tag stamped on records this provider produces.
    fn source(&self) -> Source;

    /// Attempt to produce a record. `None` means no data from this source.
    async fn resolve(&self) -> Result<Option<Record>, ProviderError>;
}

/// Fill page-derived fields from the snapshot when they are still empty.
pub(crate) fn fill_page_fields(record: &mut Record, schema: &RecordSchema, page: &PageSnapshot) {
    for field in schema.fields {
        let Some(page_value) = field.page else {
            continue;
        };
        if record.get(field.name).is_some() {
            continue;
        }
        let value = match page_value {
            PageValue::Url => page.url().to_string(),
            PageValue::Title => page.title(),
        };
        if !value.is_empty() {
            record.set(field.name, value);
        }
    }
}
