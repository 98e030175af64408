//! Fallback provider: the guaranteed terminal record.

use super::fill_page_fields;
use crate::record::{Record, Source};
use crate::schema::RecordSchema;
use meetway_rs_dom::PageSnapshot;
use std::sync::Arc;

/// Produces an empty record with only the page-derived fields filled.
/// Always succeeds; this is why resolution is total.
///
/// Deliberately not an `InfoProvider`: its record is empty by definition,
/// so the pipeline's non-empty gate could never accept it from the scan
/// list. It is the terminal state instead.
pub struct FallbackProvider {
    schema: &'static RecordSchema,
    page: Arc<PageSnapshot>,
}

impl FallbackProvider {
    pub fn new(schema: &'static RecordSchema, page: Arc<PageSnapshot>) -> Self {
        Self { schema, page }
    }

    /// Build the fallback record directly; infallible by construction.
    pub fn record(&self) -> Record {
        let mut record = Record::empty(self.schema, Source::Fallback);
        fill_page_fields(&mut record, self.schema, &self.page);
        record
    }
}
