//! Error types for selector parsing.

use thiserror::Error;

/// Errors returned while parsing a selector string.
#[derive(Debug, Error)]
pub enum SelectorError {
    /// The selector string was empty or all whitespace.
    #[error("empty selector")]
    Empty,
    /// The selector uses syntax this engine does not support.
    #[error("unsupported selector syntax: {0}")]
    Unsupported(String),
    /// The selector could not be parsed at all.
    #[error("invalid selector: {0}")]
    Invalid(String),
}
