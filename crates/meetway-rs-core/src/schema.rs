//! Versioned canonical record schemas.
//!
//! Everything the providers do is driven by this data: the alias table the
//! manual provider scans, the default selector catalog the DOM provider
//! walks, the data-attributes preferred during extraction, and the cookie
//! names the cookie provider reads. Ordering is significant throughout;
//! the first alias, selector, or attribute that yields a value wins.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// The two record kinds the engine resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Event,
    User,
}

impl RecordKind {
    /// Kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Event => "event",
            RecordKind::User => "user",
        }
    }

    /// Fixed persistent-store key for this kind.
    pub fn storage_key(&self) -> &'static str {
        match self {
            RecordKind::Event => "meetway_event_info",
            RecordKind::User => "meetway_user_info",
        }
    }

    /// Schema version this deployment resolves the kind with.
    pub fn schema(&self) -> &'static RecordSchema {
        match self {
            RecordKind::Event => &EVENT_V1,
            RecordKind::User => &USER_V1,
        }
    }
}

/// How a field serializes when it has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Empty placeholder is `""`.
    Text,
    /// Empty placeholder is `null`.
    Identity,
}

/// Page-snapshot value a field is filled from by every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageValue {
    Url,
    Title,
}

/// Declaration of one canonical field.
#[derive(Debug)]
pub struct FieldSpec {
    /// Canonical field name.
    pub name: &'static str,
    pub kind: FieldKind,
    /// Accepted raw input keys, in precedence order. Includes the name.
    pub aliases: &'static [&'static str],
    /// Data-attributes preferred over text during DOM extraction.
    pub data_attrs: &'static [&'static str],
    /// Default selector list, overridable wholesale via config.
    pub selectors: &'static [&'static str],
    /// Cookie name suffix, when the field round-trips through cookies.
    pub cookie: Option<&'static str>,
    /// Set when the field is derived from the page snapshot, not scraped.
    pub page: Option<PageValue>,
}

/// A versioned canonical schema for one record kind.
#[derive(Debug)]
pub struct RecordSchema {
    pub kind: RecordKind,
    pub version: u32,
    pub fields: &'static [FieldSpec],
}

/// Alias-resolved raw input, split into canonical and pass-through parts.
#[derive(Debug, Default)]
pub struct NormalizedFields {
    /// Canonical field name to string value.
    pub fields: Map<String, Value>,
    /// Caller extension keys, never interpreted.
    pub custom: Map<String, Value>,
}

impl RecordSchema {
    /// Look up a field declaration by canonical name.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Alias-resolve a raw input object into canonical fields.
    ///
    /// Returns `None` when the input is not an object; that is "no data",
    /// not an error. Per field, the first alias present with a usable value
    /// wins; empty strings and nulls fall through to the next alias. Keys
    /// that alias no field land in the pass-through custom map, along with
    /// the contents of an explicit `customData` object.
    pub fn normalize(&self, raw: &Value) -> Option<NormalizedFields> {
        let object = raw.as_object()?;
        let mut normalized = NormalizedFields::default();

        for field in self.fields {
            let value = field
                .aliases
                .iter()
                .find_map(|alias| object.get(*alias).and_then(scalar_to_string));
            if let Some(value) = value {
                normalized
                    .fields
                    .insert(field.name.to_string(), Value::String(value));
            }
        }

        for (key, value) in object {
            if key == "customData" {
                if let Some(extra) = value.as_object() {
                    normalized.custom.extend(extra.clone());
                }
                continue;
            }
            let aliased = self
                .fields
                .iter()
                .any(|field| field.aliases.contains(&key.as_str()));
            if !aliased {
                normalized.custom.insert(key.clone(), value.clone());
            }
        }

        Some(normalized)
    }
}

/// Render a scalar raw value as a field string. Empty strings fall through.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Effective selector lists for one record kind.
///
/// Built once at session startup from the schema defaults and the
/// `detection` config overrides. An override replaces a field's list
/// wholesale; overrides naming unknown fields are dropped with a warning.
#[derive(Debug, Clone)]
pub struct SelectorCatalog {
    lists: Vec<(&'static str, Vec<String>)>,
}

impl SelectorCatalog {
    /// Build the catalog for a schema with config overrides applied.
    pub fn new(schema: &'static RecordSchema, overrides: &HashMap<String, Vec<String>>) -> Self {
        for field in overrides.keys() {
            if schema.field(field).is_none() {
                warn!(
                    "ignoring selector override for unknown {} field {field:?}",
                    schema.kind.as_str()
                );
            }
        }
        let lists = schema
            .fields
            .iter()
            .map(|field| {
                let list = match overrides.get(field.name) {
                    Some(custom) => custom.clone(),
                    None => field.selectors.iter().map(|s| s.to_string()).collect(),
                };
                (field.name, list)
            })
            .collect();
        Self { lists }
    }

    /// Selector list for a canonical field, in scan order.
    pub fn selectors(&self, field: &str) -> &[String] {
        self.lists
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, list)| list.as_slice())
            .unwrap_or(&[])
    }
}

/// Event record schema, version 1.
pub static EVENT_V1: RecordSchema = RecordSchema {
    kind: RecordKind::Event,
    version: 1,
    fields: &[
        FieldSpec {
            name: "name",
            kind: FieldKind::Text,
            aliases: &["name", "title", "eventName"],
            data_attrs: &["data-event-name", "data-event-title", "data-concert-name"],
            selectors: &[
                "h1",
                "h2",
                "h3",
                ".event-title",
                ".event-name",
                "[data-event-name]",
                ".title",
                ".product-title",
                ".concert-title",
                ".show-title",
                ".festival-title",
                "[data-event-title]",
                "[data-concert-name]",
            ],
            cookie: Some("name"),
            page: None,
        },
        FieldSpec {
            name: "date",
            kind: FieldKind::Text,
            aliases: &["date", "eventDate", "datetime"],
            data_attrs: &[
                "data-event-date",
                "data-concert-date",
                "data-show-date",
                "datetime",
            ],
            selectors: &[
                "[data-event-date]",
                ".event-date",
                ".date",
                ".event-time",
                "time",
                "[datetime]",
                ".event-datetime",
                ".concert-date",
                ".show-date",
                ".festival-date",
                ".event-schedule",
                "[data-concert-date]",
                "[data-show-date]",
            ],
            cookie: Some("date"),
            page: None,
        },
        FieldSpec {
            name: "time",
            kind: FieldKind::Text,
            aliases: &["time", "eventTime"],
            data_attrs: &[],
            selectors: &[],
            cookie: None,
            page: None,
        },
        FieldSpec {
            name: "location",
            kind: FieldKind::Text,
            aliases: &["location", "venue", "place", "address"],
            data_attrs: &["data-event-location", "data-venue", "data-location"],
            selectors: &[
                "[data-event-location]",
                ".event-location",
                ".location",
                ".venue",
                ".place",
                ".address",
                ".concert-venue",
                ".show-venue",
                ".festival-location",
                ".event-venue",
                "[data-venue]",
                "[data-location]",
                ".event-place",
            ],
            cookie: Some("location"),
            page: None,
        },
        FieldSpec {
            name: "price",
            kind: FieldKind::Text,
            aliases: &["price", "ticketPrice", "cost"],
            data_attrs: &["data-event-price", "data-price", "data-ticket-price"],
            selectors: &[
                "[data-event-price]",
                ".event-price",
                ".price",
                ".ticket-price",
                ".cost",
                ".amount",
                ".price-amount",
                ".concert-price",
                ".show-price",
                ".festival-price",
                ".ticket-cost",
                "[data-price]",
                "[data-ticket-price]",
                ".event-cost",
            ],
            cookie: Some("price"),
            page: None,
        },
        FieldSpec {
            name: "id",
            kind: FieldKind::Text,
            aliases: &["id", "eventId", "event_id"],
            data_attrs: &[
                "data-event-id",
                "data-concert-id",
                "data-show-id",
                "data-festival-id",
                "data-product-id",
                "data-item-id",
            ],
            selectors: &[
                "[data-event-id]",
                ".event-id",
                "[data-concert-id]",
                "[data-show-id]",
                "[data-festival-id]",
                ".event-identifier",
                "[data-product-id]",
                "[data-item-id]",
                ".event-uuid",
            ],
            cookie: Some("id"),
            page: None,
        },
        FieldSpec {
            name: "url",
            kind: FieldKind::Text,
            aliases: &["url"],
            data_attrs: &[],
            selectors: &[],
            cookie: None,
            page: Some(PageValue::Url),
        },
        FieldSpec {
            name: "pageTitle",
            kind: FieldKind::Text,
            aliases: &["pageTitle"],
            data_attrs: &[],
            selectors: &[],
            cookie: None,
            page: Some(PageValue::Title),
        },
    ],
};

/// User record schema, version 1.
pub static USER_V1: RecordSchema = RecordSchema {
    kind: RecordKind::User,
    version: 1,
    fields: &[
        FieldSpec {
            name: "id",
            kind: FieldKind::Identity,
            aliases: &["id", "userId", "user_id"],
            data_attrs: &["data-user-id", "data-userid", "data-account-id"],
            selectors: &[
                "[data-user-id]",
                "[data-userid]",
                ".user-id",
                ".userid",
                "[data-account-id]",
                ".account-id",
                ".member-id",
            ],
            cookie: Some("user_id"),
            page: None,
        },
        FieldSpec {
            name: "name",
            kind: FieldKind::Identity,
            aliases: &["name", "fullName", "full_name"],
            data_attrs: &["data-user-name", "data-name"],
            selectors: &[
                "[data-user-name]",
                "[data-name]",
                ".user-name",
                ".name",
                ".full-name",
                ".account-name",
                ".member-name",
            ],
            cookie: Some("name"),
            page: None,
        },
        FieldSpec {
            name: "email",
            kind: FieldKind::Identity,
            aliases: &["email", "mail"],
            data_attrs: &["data-user-email", "data-email"],
            selectors: &[
                "[data-user-email]",
                "[data-email]",
                ".user-email",
                ".email",
                "input[type=\"email\"]",
                ".account-email",
                ".member-email",
            ],
            cookie: Some("email"),
            page: None,
        },
        FieldSpec {
            name: "phone",
            kind: FieldKind::Identity,
            aliases: &["phone", "telephone", "phoneNumber"],
            data_attrs: &["data-user-phone", "data-phone"],
            selectors: &[
                "[data-user-phone]",
                "[data-phone]",
                ".user-phone",
                ".phone",
                "input[type=\"tel\"]",
                ".account-phone",
                ".member-phone",
            ],
            cookie: Some("phone"),
            page: None,
        },
    ],
};
