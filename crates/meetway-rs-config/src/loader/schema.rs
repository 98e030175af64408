//! Schema validation helpers for widget JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a config document against the schema.
///
/// `eventData` and `userData` are deliberately unvalidated: they are raw,
/// caller-controlled payloads the manual provider alias-resolves later.
pub(super) fn validate_schema(value: &Value) -> Result<(), ConfigError> {
    let map = expect_object(value, "")?;
    let allowed = [
        "$schema",
        "eventData",
        "userData",
        "detection",
        "storage",
        "cookies",
    ];
    ensure_allowed_keys(map, &allowed, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, "$schema")?;
    }
    if let Some(value) = map.get("detection") {
        validate_detection(value, "detection")?;
    }
    if let Some(value) = map.get("storage") {
        validate_storage(value, "storage")?;
    }
    if let Some(value) = map.get("cookies") {
        validate_cookies(value, "cookies")?;
    }

    Ok(())
}

/// Validate the "detection" block: per-kind maps of selector lists.
fn validate_detection(value: &Value, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, path)?;
    ensure_allowed_keys(map, &["event", "user"], path)?;
    for kind in ["event", "user"] {
        if let Some(value) = map.get(kind) {
            let kind_path = join_path(path, kind);
            let fields = expect_object(value, &kind_path)?;
            for (field, selectors) in fields {
                validate_string_array(selectors, &join_path(&kind_path, field))?;
            }
        }
    }
    Ok(())
}

/// Validate the "storage" block.
fn validate_storage(value: &Value, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, path)?;
    ensure_allowed_keys(map, &["root", "eventTtlSecs", "userTtlSecs"], path)?;
    if let Some(value) = map.get("root") {
        expect_string(value, &join_path(path, "root"))?;
    }
    for key in ["eventTtlSecs", "userTtlSecs"] {
        if let Some(value) = map.get(key) {
            if !value.is_u64() {
                return Err(invalid(
                    &join_path(path, key),
                    "expected a non-negative integer",
                ));
            }
        }
    }
    Ok(())
}

/// Validate the "cookies" block.
fn validate_cookies(value: &Value, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, path)?;
    ensure_allowed_keys(map, &["eventPrefix", "userPrefix"], path)?;
    for key in ["eventPrefix", "userPrefix"] {
        if let Some(value) = map.get(key) {
            expect_string(value, &join_path(path, key))?;
        }
    }
    Ok(())
}

fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid(&join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

fn expect_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ConfigError> {
    value
        .as_object()
        .ok_or_else(|| invalid(path, "expected an object"))
}

fn expect_string(value: &Value, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid(path, "expected a string"))
    }
}

fn validate_string_array(value: &Value, path: &str) -> Result<(), ConfigError> {
    let entries = value
        .as_array()
        .ok_or_else(|| invalid(path, "expected an array of selector strings"))?;
    for (idx, entry) in entries.iter().enumerate() {
        if !entry.is_string() {
            return Err(invalid(&format!("{path}[{idx}]"), "expected a string"));
        }
    }
    Ok(())
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn invalid(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: if path.is_empty() { "config" } else { path }.to_string(),
        message: message.to_string(),
    }
}
