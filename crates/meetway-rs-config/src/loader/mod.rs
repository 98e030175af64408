//! Config loading with key-level schema validation.
//!
//! Options arrive either as a JSON5 file next to the embed script or as a
//! raw string from the host page; both paths validate keys before decoding
//! so a typo in a selector override fails loudly instead of silently
//! keeping the defaults.

mod schema;


use crate::{ConfigError, WidgetConfig};
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::path::Path;

impl WidgetConfig {
    /// Load config from a JSON5 file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading widget config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    /// Load config from JSON5 contents.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading widget config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value)
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.event_ttl_secs == 0 || self.storage.user_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "storage TTLs must be greater than zero".to_string(),
            ));
        }
        if self.cookies.event_prefix.is_empty() || self.cookies.user_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "cookie prefixes must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn config_from_value(value: Value) -> Result<WidgetConfig, ConfigError> {
    schema::validate_schema(&value)?;
    let config: WidgetConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
