//! Cookie provider: one prefixed cookie per scalar field.

use super::{InfoProvider, ProviderError, fill_page_fields};
use crate::cookies::CookieJar;
use crate::record::{Record, Source};
use crate::schema::RecordSchema;
use async_trait::async_trait;
use log::debug;
use meetway_rs_dom::PageSnapshot;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cookie name suffix holding the JSON-encoded free-form map.
const CUSTOM_DATA_COOKIE: &str = "custom_data";

/// Reads and writes canonical fields as prefixed cookies. Expiry is the
/// browser's business; this provider tracks no TTL of its own.
pub struct CookieProvider {
    schema: &'static RecordSchema,
    prefix: String,
    jar: Arc<Mutex<CookieJar>>,
    page: Arc<PageSnapshot>,
}

impl CookieProvider {
    /// Create a provider over a shared jar with the kind's name prefix.
    pub fn new(
        schema: &'static RecordSchema,
        prefix: impl Into<String>,
        jar: Arc<Mutex<CookieJar>>,
        page: Arc<PageSnapshot>,
    ) -> Self {
        Self {
            schema,
            prefix: prefix.into(),
            jar,
            page,
        }
    }

    /// Read a record from the jar. A field is present iff its cookie is
    /// present and non-empty; an unparseable custom-data cookie decays to
    /// an empty map instead of failing the read.
    pub fn load(&self) -> Option<Record> {
        let jar = self.jar.lock();
        let mut record = Record::empty(self.schema, Source::Cookie);
        let mut found = false;

        for field in self.schema.fields {
            let Some(cookie) = field.cookie else {
                continue;
            };
            let name = format!("{}{cookie}", self.prefix);
            if let Some(value) = jar.get(&name) {
                if !value.is_empty() {
                    record.set(field.name, value);
                    found = true;
                }
            }
        }

        let custom_name = format!("{}{CUSTOM_DATA_COOKIE}", self.prefix);
        if let Some(blob) = jar.get(&custom_name) {
            match serde_json::from_str(blob) {
                Ok(serde_json::Value::Object(map)) => record.custom_data = map,
                Ok(_) | Err(_) => {
                    debug!("ignoring unparseable custom-data cookie ({custom_name})");
                }
            }
        }
        drop(jar);

        if !found {
            return None;
        }
        fill_page_fields(&mut record, self.schema, &self.page);
        Some(record)
    }

    /// Write a record's non-empty fields back as prefixed cookies, plus
    /// one JSON cookie for the free-form map.
    pub fn save(&self, record: &Record) -> bool {
        let mut jar = self.jar.lock();
        for field in self.schema.fields {
            let Some(cookie) = field.cookie else {
                continue;
            };
            if let Some(value) = record.get(field.name) {
                jar.set(format!("{}{cookie}", self.prefix), value);
            }
        }
        if !record.custom_data.is_empty() {
            match serde_json::to_string(&record.custom_data) {
                Ok(blob) => jar.set(format!("{}{CUSTOM_DATA_COOKIE}", self.prefix), blob),
                Err(_) => return false,
            }
        }
        true
    }
}

#[async_trait]
impl InfoProvider for CookieProvider {
    fn source(&self) -> Source {
        Source::Cookie
    }

    async fn resolve(&self) -> Result<Option<Record>, ProviderError> {
        Ok(self.load())
    }
}
