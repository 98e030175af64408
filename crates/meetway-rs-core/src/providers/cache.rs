//! Persistent cache provider: TTL-gated records from the durable store.

use super::{InfoProvider, ProviderError};
use crate::record::{Record, Source};
use crate::schema::RecordSchema;
use crate::store::{InfoStore, StoreError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{debug, warn};
use std::sync::Arc;

/// Reads and writes one record blob under a fixed key, enforcing the
/// record kind's TTL on the stored timestamp.
pub struct CacheProvider {
    schema: &'static RecordSchema,
    store: Arc<dyn InfoStore>,
    key: &'static str,
    ttl: Duration,
}

impl CacheProvider {
    /// Create a provider over a store slot with the kind's TTL.
    pub fn new(
        schema: &'static RecordSchema,
        store: Arc<dyn InfoStore>,
        key: &'static str,
        ttl: Duration,
    ) -> Self {
        Self {
            schema,
            store,
            key,
            ttl,
        }
    }

    /// Load the cached record, enforcing TTL.
    ///
    /// A blob that fails to decode and a blob older than the TTL are both
    /// treated as absent, and the slot is cleared so the next load is
    /// cheap. A returned record is re-stamped to resolution time; the
    /// stored stamp only feeds the TTL check.
    pub fn load(&self) -> Result<Option<Record>, ProviderError> {
        let Some(blob) = self.store.load(self.key)? else {
            return Ok(None);
        };
        let mut record: Record = match serde_json::from_str(&blob) {
            Ok(record) => record,
            Err(err) => {
                warn!("discarding corrupt cache entry (key={}): {err}", self.key);
                self.clear_slot();
                return Ok(None);
            }
        };
        let age = Utc::now() - record.timestamp;
        if age > self.ttl {
            debug!(
                "cache entry expired (key={}, age_secs={}, ttl_secs={})",
                self.key,
                age.num_seconds(),
                self.ttl.num_seconds()
            );
            self.clear_slot();
            return Ok(None);
        }
        record.source = Source::Cache;
        record.timestamp = Utc::now();
        Ok(Some(record))
    }

    /// Persist a record, stamping it with the current time first.
    ///
    /// Store rejection (quota, disabled storage) is reported as `false`,
    /// never an error; resolution continues without persistence.
    pub fn save(&self, record: &Record) -> bool {
        let mut stamped = record.clone();
        stamped.timestamp = Utc::now();
        let written = serde_json::to_string(&stamped)
            .map_err(StoreError::from)
            .and_then(|blob| self.store.save(self.key, &blob));
        match written {
            Ok(()) => {
                debug!(
                    "persisted {} record (key={})",
                    self.schema.kind.as_str(),
                    self.key
                );
                true
            }
            Err(err) => {
                warn!("failed to persist record (key={}): {err}", self.key);
                false
            }
        }
    }

    fn clear_slot(&self) {
        if let Err(err) = self.store.clear(self.key) {
            warn!("failed to clear cache slot (key={}): {err}", self.key);
        }
    }
}

#[async_trait]
impl InfoProvider for CacheProvider {
    fn source(&self) -> Source {
        Source::Cache
    }

    async fn resolve(&self) -> Result<Option<Record>, ProviderError> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::CacheProvider;
    use crate::record::{Record, Source};
    use crate::schema::{EVENT_V1, RecordKind, USER_V1};
    use crate::store::{InfoStore, MemoryInfoStore, StoreError};
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn provider(store: Arc<dyn InfoStore>, ttl: Duration) -> CacheProvider {
        CacheProvider::new(&EVENT_V1, store, RecordKind::Event.storage_key(), ttl)
    }

    #[test]
    fn save_then_load_round_trips_fields() {
        let store = Arc::new(MemoryInfoStore::default());
        let cache = provider(store, Duration::days(1));

        let mut record = Record::empty(&EVENT_V1, Source::Manual);
        record.set("name", "Jazz Night");
        record.set("date", "2025-05-01");
        assert!(cache.save(&record));

        let loaded = cache.load().expect("load").expect("record");
        assert_eq!(loaded.get("name"), Some("Jazz Night"));
        assert_eq!(loaded.get("date"), Some("2025-05-01"));
        // Loaded records always claim the cache as their source.
        assert_eq!(loaded.source, Source::Cache);
    }

    #[test]
    fn entries_expire_strictly_after_ttl() {
        let store: Arc<MemoryInfoStore> = Arc::new(MemoryInfoStore::default());
        let ttl = Duration::hours(1);
        let cache = provider(store.clone(), ttl);

        let mut fresh = Record::empty(&EVENT_V1, Source::Manual);
        fresh.set("name", "Jazz Night");
        fresh.timestamp = Utc::now() - ttl + Duration::minutes(1);
        store
            .save(
                RecordKind::Event.storage_key(),
                &serde_json::to_string(&fresh).expect("json"),
            )
            .expect("seed");
        assert!(cache.load().expect("load").is_some());

        let mut stale = fresh.clone();
        stale.timestamp = Utc::now() - ttl - Duration::minutes(1);
        store
            .save(
                RecordKind::Event.storage_key(),
                &serde_json::to_string(&stale).expect("json"),
            )
            .expect("seed");
        assert!(cache.load().expect("load").is_none());
        // The expired slot was cleared proactively.
        assert_eq!(
            store.load(RecordKind::Event.storage_key()).expect("load"),
            None
        );
    }

    #[test]
    fn corrupt_blob_is_absent_and_cleared() {
        let store: Arc<MemoryInfoStore> = Arc::new(MemoryInfoStore::default());
        store
            .save(RecordKind::Event.storage_key(), "{not json")
            .expect("seed");
        let cache = provider(store.clone(), Duration::days(1));
        assert!(cache.load().expect("load").is_none());
        assert_eq!(
            store.load(RecordKind::Event.storage_key()).expect("load"),
            None
        );
    }

    #[test]
    fn save_reports_false_on_store_rejection() {
        struct RejectingStore;
        impl InfoStore for RejectingStore {
            fn load(&self, _key: &str) -> Result<Option<String>, StoreError> {
                Ok(None)
            }
            fn save(&self, _key: &str, _blob: &str) -> Result<(), StoreError> {
                Err(StoreError::Io(std::io::Error::other("quota exceeded")))
            }
            fn clear(&self, _key: &str) -> Result<(), StoreError> {
                Ok(())
            }
        }

        let cache = CacheProvider::new(
            &USER_V1,
            Arc::new(RejectingStore),
            RecordKind::User.storage_key(),
            Duration::days(7),
        );
        let record = Record::empty(&USER_V1, Source::Manual);
        assert!(!cache.save(&record));
    }
}
