//! Configuration schema for the widget engine.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// Root options object supplied by the embedding shell at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WidgetConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    /// Raw, unaliased event data. Any shape; non-objects resolve to no data.
    #[serde(default, rename = "eventData")]
    pub event_data: Option<Value>,
    /// Raw, unaliased user data. Any shape; non-objects resolve to no data.
    #[serde(default, rename = "userData")]
    pub user_data: Option<Value>,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cookies: CookiesConfig,
}

impl WidgetConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> WidgetConfigBuilder {
        WidgetConfigBuilder::new()
    }
}

/// Builder for assembling a `WidgetConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct WidgetConfigBuilder {
    config: WidgetConfig,
}

impl WidgetConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: WidgetConfig::default(),
        }
    }

    /// Supply raw manual event data.
    pub fn event_data(mut self, data: Value) -> Self {
        self.config.event_data = Some(data);
        self
    }

    /// Supply raw manual user data.
    pub fn user_data(mut self, data: Value) -> Self {
        self.config.user_data = Some(data);
        self
    }

    /// Replace the selector catalog overrides.
    pub fn detection(mut self, detection: DetectionConfig) -> Self {
        self.config.detection = detection;
        self
    }

    /// Replace a single event-field selector list wholesale.
    pub fn event_selectors(
        mut self,
        field: impl Into<String>,
        selectors: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.config
            .detection
            .event
            .insert(field.into(), selectors.into_iter().map(Into::into).collect());
        self
    }

    /// Replace a single user-field selector list wholesale.
    pub fn user_selectors(
        mut self,
        field: impl Into<String>,
        selectors: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.config
            .detection
            .user
            .insert(field.into(), selectors.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the storage configuration.
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    /// Replace the cookie configuration.
    pub fn cookies(mut self, cookies: CookiesConfig) -> Self {
        self.config.cookies = cookies;
        self
    }

    /// Finalize and return the built `WidgetConfig`.
    pub fn build(self) -> WidgetConfig {
        self.config
    }
}

/// Selector catalog overrides, keyed by canonical field name.
///
/// An entry replaces the built-in list for that field wholesale; absent
/// fields keep the schema defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DetectionConfig {
    #[serde(default)]
    pub event: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub user: HashMap<String, Vec<String>>,
}

/// Persistent store location and per-kind record TTLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Store root directory. Defaults to the platform data dir.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Event records are perishable: one day by default.
    #[serde(default = "default_event_ttl_secs")]
    pub event_ttl_secs: u64,
    /// User identity keeps for a week by default.
    #[serde(default = "default_user_ttl_secs")]
    pub user_ttl_secs: u64,
}

fn default_event_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_user_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            event_ttl_secs: default_event_ttl_secs(),
            user_ttl_secs: default_user_ttl_secs(),
        }
    }
}

impl StorageConfig {
    /// Event record TTL as a duration.
    pub fn event_ttl(&self) -> Duration {
        ttl_duration(self.event_ttl_secs)
    }

    /// User record TTL as a duration.
    pub fn user_ttl(&self) -> Duration {
        ttl_duration(self.user_ttl_secs)
    }
}

/// TTL seconds as a duration, saturating at the representable maximum.
fn ttl_duration(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// Cookie name prefixes, one per record kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookiesConfig {
    #[serde(default = "default_event_prefix")]
    pub event_prefix: String,
    #[serde(default = "default_user_prefix")]
    pub user_prefix: String,
}

fn default_event_prefix() -> String {
    "meetway_event_".to_string()
}

fn default_user_prefix() -> String {
    "meetway_".to_string()
}

impl Default for CookiesConfig {
    fn default() -> Self {
        Self {
            event_prefix: default_event_prefix(),
            user_prefix: default_user_prefix(),
        }
    }
}
