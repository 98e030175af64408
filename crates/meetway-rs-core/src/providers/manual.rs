//! Manual provider: caller-supplied raw data, alias-normalized.

use super::{InfoProvider, ProviderError, fill_page_fields};
use crate::record::{Record, Source};
use crate::schema::RecordSchema;
use async_trait::async_trait;
use log::debug;
use meetway_rs_dom::PageSnapshot;
use serde_json::Value;
use std::sync::Arc;

/// Normalizes the raw object handed over in the init options.
pub struct ManualProvider {
    schema: &'static RecordSchema,
    raw: Option<Value>,
    page: Arc<PageSnapshot>,
}

impl ManualProvider {
    /// Create a provider over the raw init data, if any was supplied.
    pub fn new(schema: &'static RecordSchema, raw: Option<Value>, page: Arc<PageSnapshot>) -> Self {
        Self { schema, raw, page }
    }
}

#[async_trait]
impl InfoProvider for ManualProvider {
    fn source(&self) -> Source {
        Source::Manual
    }

    async fn resolve(&self) -> Result<Option<Record>, ProviderError> {
        let Some(raw) = &self.raw else {
            return Ok(None);
        };
        let Some(normalized) = self.schema.normalize(raw) else {
            debug!(
                "manual {} data is not an object; treating as no data",
                self.schema.kind.as_str()
            );
            return Ok(None);
        };

        let mut record = Record::empty(self.schema, Source::Manual);
        for (field, value) in normalized.fields {
            if let Value::String(text) = value {
                record.set(&field, text);
            }
        }
        record.custom_data = normalized.custom;
        // An aliased url/pageTitle wins over the snapshot values.
        fill_page_fields(&mut record, self.schema, &self.page);
        Ok(Some(record))
    }
}
