//! Resolution engine for the Meetway widget.
//!
//! This crate owns the canonical record schemas, the five information
//! providers, the priority-ordered resolution pipeline, and the widget
//! session the embedding shell talks to.

pub mod cookies;
pub mod pipeline;
pub mod providers;
pub mod record;
pub mod schema;
pub mod session;
pub mod store;

/// Cookie header parsing and rendering.
pub use cookies::CookieJar;
/// Priority-ordered provider pipeline.
pub use pipeline::ResolutionPipeline;
/// Provider capability and the five concrete providers.
pub use providers::{
    CacheProvider, CookieProvider, DomProvider, FallbackProvider, InfoProvider, ManualProvider,
    ProviderError,
};
/// Canonical records and their source tags.
pub use record::{Record, Source};
/// Versioned canonical schemas and the selector catalog.
pub use schema::{FieldKind, FieldSpec, RecordKind, RecordSchema, SelectorCatalog};
/// Session context created at widget initialization.
pub use session::{ResolvedRecords, WidgetSession};
/// Persistent key-value stores.
pub use store::{FileInfoStore, InfoStore, MemoryInfoStore, StoreError};
