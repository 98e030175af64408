//! Canonical record values produced by the resolution pipeline.

use crate::schema::{FieldKind, RecordSchema};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The provider that produced a whole record. Exactly one per record;
/// partial merges across providers never happen within one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Manual,
    Cache,
    Cookie,
    Dom,
    Fallback,
}

impl Source {
    /// Source as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Manual => "manual",
            Source::Cache => "cache",
            Source::Cookie => "cookie",
            Source::Dom => "dom",
            Source::Fallback => "fallback",
        }
    }
}

/// Immutable snapshot of resolved event or user data.
///
/// Canonical fields serialize flattened next to the metadata, so the
/// persisted blob is `{ ...fields, customData, source, timestamp }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub source: Source,
    /// Resolution instant, not original observation time.
    pub timestamp: DateTime<Utc>,
    /// Caller extension fields, passed through and never interpreted.
    #[serde(default, rename = "customData", skip_serializing_if = "Map::is_empty")]
    pub custom_data: Map<String, Value>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Record {
    /// Record with every field at its empty placeholder, stamped now.
    pub fn empty(schema: &RecordSchema, source: Source) -> Self {
        let mut fields = Map::new();
        for field in schema.fields {
            let placeholder = match field.kind {
                FieldKind::Text => Value::String(String::new()),
                FieldKind::Identity => Value::Null,
            };
            fields.insert(field.name.to_string(), placeholder);
        }
        Self {
            source,
            timestamp: Utc::now(),
            custom_data: Map::new(),
            fields,
        }
    }

    /// Non-empty value of a canonical field.
    pub fn get(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(Value::String(text)) if !text.is_empty() => Some(text),
            _ => None,
        }
    }

    /// Set a canonical field value.
    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.fields
            .insert(field.to_string(), Value::String(value.into()));
    }

    /// Schema-aware emptiness: true iff every canonical field that is not
    /// page-derived is absent or empty. Metadata (`source`, `timestamp`,
    /// `customData`) never counts.
    pub fn is_empty(&self, schema: &RecordSchema) -> bool {
        schema
            .fields
            .iter()
            .filter(|field| field.page.is_none())
            .all(|field| self.get(field.name).is_none())
    }

    /// Shallow overlay of alias-resolved partial fields onto this record.
    ///
    /// Produces a new record with a fresh timestamp and an unchanged
    /// source; the overlay never claims a new source. Partial keys that
    /// alias no canonical field accumulate in `customData`. A non-object
    /// partial overlays nothing.
    pub fn overlay(&self, schema: &RecordSchema, partial: &Value) -> Record {
        let mut next = self.clone();
        next.timestamp = Utc::now();
        if let Some(normalized) = schema.normalize(partial) {
            for (field, value) in normalized.fields {
                next.fields.insert(field, value);
            }
            next.custom_data.extend(normalized.custom);
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::{Record, Source};
    use crate::schema::{EVENT_V1, USER_V1};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    #[test]
    fn empty_placeholders_follow_field_kind() {
        let event = Record::empty(&EVENT_V1, Source::Fallback);
        let user = Record::empty(&USER_V1, Source::Fallback);
        let event_json = serde_json::to_value(&event).expect("json");
        let user_json = serde_json::to_value(&user).expect("json");
        assert_eq!(event_json["name"], json!(""));
        assert_eq!(event_json["date"], json!(""));
        assert_eq!(user_json["email"], Value::Null);
        assert_eq!(user_json["id"], Value::Null);
    }

    #[test]
    fn emptiness_ignores_page_fields_and_custom_data() {
        let mut record = Record::empty(&EVENT_V1, Source::Manual);
        record.set("url", "https://tickets.example");
        record.set("pageTitle", "Tickets");
        record.custom_data.insert("campaign".into(), json!("spring"));
        assert!(record.is_empty(&EVENT_V1));

        record.set("name", "Jazz Night");
        assert!(!record.is_empty(&EVENT_V1));
    }

    #[test]
    fn overlay_with_empty_partial_only_restamps() {
        let mut record = Record::empty(&EVENT_V1, Source::Dom);
        record.set("name", "Jazz Night");
        let before = record.timestamp;

        let next = record.overlay(&EVENT_V1, &json!({}));
        assert_eq!(next.source, Source::Dom);
        assert_eq!(next.get("name"), Some("Jazz Night"));
        assert!(next.timestamp >= before);

        let mut comparable = next.clone();
        comparable.timestamp = record.timestamp;
        assert_eq!(comparable, record);
    }

    #[test]
    fn overlay_resolves_aliases_and_routes_unknown_keys() {
        let record = Record::empty(&EVENT_V1, Source::Manual);
        let next = record.overlay(
            &EVENT_V1,
            &json!({ "venue": "Blue Note", "promoCode": "SPRING" }),
        );
        assert_eq!(next.get("location"), Some("Blue Note"));
        assert_eq!(next.custom_data["promoCode"], json!("SPRING"));
        assert_eq!(next.source, Source::Manual);
    }

    #[test]
    fn serialized_shape_is_flat_with_metadata() {
        let mut record = Record::empty(&USER_V1, Source::Cookie);
        record.set("email", "a@b.example");
        let value = serde_json::to_value(&record).expect("json");
        assert_eq!(value["email"], json!("a@b.example"));
        assert_eq!(value["source"], json!("cookie"));
        assert!(value.get("timestamp").is_some());
        // Empty custom data is omitted from the blob.
        assert!(value.get("customData").is_none());

        let parsed: Record = serde_json::from_value(value).expect("record");
        assert_eq!(parsed, record);
    }
}
