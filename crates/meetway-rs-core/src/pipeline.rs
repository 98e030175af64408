//! Priority-ordered resolution over the information providers.

use crate::providers::{FallbackProvider, InfoProvider};
use crate::record::Record;
use crate::schema::RecordSchema;
use log::{debug, info, warn};

/// Runs the providers in priority order and returns the first record that
/// carries any canonical data, falling back to the terminal provider.
///
/// Resolution is total: provider errors are logged and skipped, so the
/// caller always receives a record.
pub struct ResolutionPipeline {
    schema: &'static RecordSchema,
    providers: Vec<Box<dyn InfoProvider>>,
    fallback: FallbackProvider,
}

impl ResolutionPipeline {
    /// Assemble a pipeline. Providers are tried in the order given.
    pub fn new(
        schema: &'static RecordSchema,
        providers: Vec<Box<dyn InfoProvider>>,
        fallback: FallbackProvider,
    ) -> Self {
        Self {
            schema,
            providers,
            fallback,
        }
    }

    /// Resolve one record.
    ///
    /// A provider that returns a record with no canonical data does not
    /// win; the scan continues. Only whole records move through the
    /// pipeline, never field-level merges.
    pub async fn resolve(&self) -> Record {
        for provider in &self.providers {
            let source = provider.source();
            match provider.resolve().await {
                Ok(Some(record)) if !record.is_empty(self.schema) => {
                    info!(
                        "resolved {} record from {}",
                        self.schema.kind.as_str(),
                        source.as_str()
                    );
                    return record;
                }
                Ok(Some(_)) => {
                    debug!(
                        "{} provider produced an empty {} record; continuing",
                        source.as_str(),
                        self.schema.kind.as_str()
                    );
                }
                Ok(None) => {
                    debug!(
                        "{} provider has no {} data",
                        source.as_str(),
                        self.schema.kind.as_str()
                    );
                }
                Err(err) => {
                    warn!(
                        "{} provider failed while resolving {} data: {err}",
                        source.as_str(),
                        self.schema.kind.as_str()
                    );
                }
            }
        }
        info!(
            "no provider produced {} data; using fallback",
            self.schema.kind.as_str()
        );
        self.fallback.record()
    }
}
