//! Configuration models and loading for the Meetway widget engine.
//!
//! This crate owns the options schema the embedding shell supplies at
//! startup: raw manual data, selector catalog overrides, storage TTLs, and
//! cookie prefixes.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Configuration schema models.
pub use model::*;
