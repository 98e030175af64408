//! Page snapshot support for the Meetway resolution engine.
//!
//! This crate owns the tolerant HTML parser, compound simple-selector
//! matching, and the read-only `PageSnapshot` the DOM provider scans.

mod document;
mod error;
mod page;
mod selector;

/// Parsed HTML document and element handles.
pub use document::{Document, Element};
/// Selector parse errors.
pub use error::SelectorError;
/// Read-only snapshot of the host page.
pub use page::PageSnapshot;
/// Compound simple selector.
pub use selector::Selector;
