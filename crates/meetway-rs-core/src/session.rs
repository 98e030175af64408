//! Widget session: resolution at startup plus overlay updates after.

use crate::cookies::CookieJar;
use crate::pipeline::ResolutionPipeline;
use crate::providers::{
    CacheProvider, CookieProvider, DomProvider, FallbackProvider, InfoProvider, ManualProvider,
};
use crate::record::{Record, Source};
use crate::schema::{RecordKind, SelectorCatalog};
use crate::store::{FileInfoStore, InfoStore, MemoryInfoStore, default_store_root};
use log::{debug, info, warn};
use meetway_rs_config::WidgetConfig;
use meetway_rs_dom::PageSnapshot;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Both resolved records, as handed to the embedding shell.
#[derive(Debug, Clone)]
pub struct ResolvedRecords {
    pub event: Record,
    pub user: Record,
}

/// One widget lifetime on one page.
///
/// Construction runs both resolution pipelines; afterwards the session
/// serves snapshot reads and applies overlay updates. Reads hand out
/// clones, so a caller can never mutate session state through a record.
pub struct WidgetSession {
    config: WidgetConfig,
    page: Arc<PageSnapshot>,
    cookies: Arc<Mutex<CookieJar>>,
    store: Arc<dyn InfoStore>,
    event: Mutex<Record>,
    user: Mutex<Record>,
}

impl WidgetSession {
    /// Initialize a session, opening the persistent store from config.
    ///
    /// A store root that cannot be opened degrades to an in-memory store
    /// with a warning; initialization itself never fails.
    pub async fn init(
        config: WidgetConfig,
        page: Arc<PageSnapshot>,
        cookies: Arc<Mutex<CookieJar>>,
    ) -> Self {
        let store = open_store(&config);
        Self::init_with_store(config, page, cookies, store).await
    }

    /// Initialize with an explicit store.
    pub async fn init_with_store(
        config: WidgetConfig,
        page: Arc<PageSnapshot>,
        cookies: Arc<Mutex<CookieJar>>,
        store: Arc<dyn InfoStore>,
    ) -> Self {
        let session = Self {
            event: Mutex::new(Record::empty(RecordKind::Event.schema(), Source::Fallback)),
            user: Mutex::new(Record::empty(RecordKind::User.schema(), Source::Fallback)),
            config,
            page,
            cookies,
            store,
        };

        let event = session.resolve(RecordKind::Event).await;
        let user = session.resolve(RecordKind::User).await;
        session.persist_resolved(RecordKind::Event, &event);
        session.persist_resolved(RecordKind::User, &user);
        *session.event.lock() = event;
        *session.user.lock() = user;
        info!("widget session initialized (url={})", session.page.url());
        session
    }

    /// Run the full pipeline for one record kind.
    async fn resolve(&self, kind: RecordKind) -> Record {
        let schema = kind.schema();
        let (raw, ttl, prefix, overrides) = match kind {
            RecordKind::Event => (
                self.config.event_data.clone(),
                self.config.storage.event_ttl(),
                self.config.cookies.event_prefix.clone(),
                &self.config.detection.event,
            ),
            RecordKind::User => (
                self.config.user_data.clone(),
                self.config.storage.user_ttl(),
                self.config.cookies.user_prefix.clone(),
                &self.config.detection.user,
            ),
        };

        let providers: Vec<Box<dyn InfoProvider>> = vec![
            Box::new(ManualProvider::new(schema, raw, self.page.clone())),
            Box::new(CacheProvider::new(
                schema,
                self.store.clone(),
                kind.storage_key(),
                ttl,
            )),
            Box::new(CookieProvider::new(
                schema,
                prefix,
                self.cookies.clone(),
                self.page.clone(),
            )),
            Box::new(DomProvider::new(
                schema,
                self.page.clone(),
                SelectorCatalog::new(schema, overrides),
            )),
        ];
        let fallback = FallbackProvider::new(schema, self.page.clone());
        ResolutionPipeline::new(schema, providers, fallback).resolve().await
    }

    /// Warm the cache with a freshly resolved record.
    ///
    /// Cache hits were stored already and fallback records carry nothing
    /// worth keeping, so only manual, cookie, and DOM results are written.
    fn persist_resolved(&self, kind: RecordKind, record: &Record) {
        if matches!(record.source, Source::Cache | Source::Fallback) {
            return;
        }
        self.cache_provider(kind).save(record);
    }

    fn cache_provider(&self, kind: RecordKind) -> CacheProvider {
        let ttl = match kind {
            RecordKind::Event => self.config.storage.event_ttl(),
            RecordKind::User => self.config.storage.user_ttl(),
        };
        CacheProvider::new(kind.schema(), self.store.clone(), kind.storage_key(), ttl)
    }

    /// Snapshot of the resolved event record.
    pub fn event_info(&self) -> Record {
        self.event.lock().clone()
    }

    /// Snapshot of the resolved user record.
    pub fn user_info(&self) -> Record {
        self.user.lock().clone()
    }

    /// Both resolved records.
    pub fn records(&self) -> ResolvedRecords {
        ResolvedRecords {
            event: self.event_info(),
            user: self.user_info(),
        }
    }

    /// Overlay a partial update onto one record and persist the result.
    ///
    /// The partial is alias-resolved like manual data; keys aliasing no
    /// canonical field accumulate in the record's custom data. Returns the
    /// updated record.
    pub fn update(&self, kind: RecordKind, partial: &Value) -> Record {
        let schema = kind.schema();
        let slot = match kind {
            RecordKind::Event => &self.event,
            RecordKind::User => &self.user,
        };
        let next = slot.lock().overlay(schema, partial);
        if !self.cache_provider(kind).save(&next) {
            debug!("{} update was not persisted", kind.as_str());
        }
        *slot.lock() = next.clone();
        next
    }

    /// Shared cookie jar, for the shell to render back into headers.
    pub fn cookie_jar(&self) -> Arc<Mutex<CookieJar>> {
        self.cookies.clone()
    }
}

/// Open the configured store, degrading to memory when the root is
/// unusable or unknown.
fn open_store(config: &WidgetConfig) -> Arc<dyn InfoStore> {
    let root = config.storage.root.clone().or_else(default_store_root);
    match root {
        Some(root) => match FileInfoStore::new(&root) {
            Ok(store) => Arc::new(store),
            Err(err) => {
                warn!(
                    "falling back to in-memory store (root={}): {err}",
                    root.display()
                );
                Arc::new(MemoryInfoStore::default())
            }
        },
        None => {
            warn!("no store root available; falling back to in-memory store");
            Arc::new(MemoryInfoStore::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WidgetSession;
    use crate::cookies::CookieJar;
    use crate::record::Source;
    use crate::schema::RecordKind;
    use crate::store::{InfoStore, MemoryInfoStore};
    use meetway_rs_config::WidgetConfig;
    use meetway_rs_dom::PageSnapshot;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn page(html: &str) -> Arc<PageSnapshot> {
        Arc::new(PageSnapshot::new("https://tickets.example/jazz", html))
    }

    async fn session(
        config: WidgetConfig,
        html: &str,
        cookies: &str,
        store: Arc<dyn InfoStore>,
    ) -> WidgetSession {
        WidgetSession::init_with_store(
            config,
            page(html),
            Arc::new(Mutex::new(CookieJar::parse(cookies))),
            store,
        )
        .await
    }

    #[tokio::test]
    async fn manual_data_outranks_the_page() {
        let config = WidgetConfig::builder()
            .event_data(json!({ "title": "Jazz Night", "venue": "Blue Note" }))
            .build();
        let html = "<title>Jazz Tickets</title><h1>Scraped Headline</h1>";
        let session = session(config, html, "", Arc::new(MemoryInfoStore::default())).await;

        let event = session.event_info();
        assert_eq!(event.source, Source::Manual);
        assert_eq!(event.get("name"), Some("Jazz Night"));
        assert_eq!(event.get("location"), Some("Blue Note"));
        assert_eq!(event.get("pageTitle"), Some("Jazz Tickets"));
    }

    #[tokio::test]
    async fn page_markup_resolves_when_nothing_outranks_it() {
        let html = "<title>Jazz Tickets</title><h1>Jazz Night</h1>";
        let session = session(
            WidgetConfig::default(),
            html,
            "",
            Arc::new(MemoryInfoStore::default()),
        )
        .await;

        let event = session.event_info();
        assert_eq!(event.source, Source::Dom);
        assert_eq!(event.get("name"), Some("Jazz Night"));
        // Nothing on the page names a user; the record is the fallback.
        assert_eq!(session.user_info().source, Source::Fallback);
    }

    #[tokio::test]
    async fn cookies_outrank_the_page() {
        let html = "<h1>Scraped Headline</h1>";
        let session = session(
            WidgetConfig::default(),
            html,
            "meetway_event_name=Jazz%20Night; meetway_email=a%40b.example",
            Arc::new(MemoryInfoStore::default()),
        )
        .await;

        let event = session.event_info();
        assert_eq!(event.source, Source::Cookie);
        assert_eq!(event.get("name"), Some("Jazz Night"));
        let user = session.user_info();
        assert_eq!(user.source, Source::Cookie);
        assert_eq!(user.get("email"), Some("a@b.example"));
    }

    #[tokio::test]
    async fn bare_session_resolves_to_fallback() {
        let session = session(
            WidgetConfig::default(),
            "",
            "",
            Arc::new(MemoryInfoStore::default()),
        )
        .await;
        let records = session.records();
        assert_eq!(records.event.source, Source::Fallback);
        assert_eq!(records.user.source, Source::Fallback);
        assert_eq!(records.event.get("url"), Some("https://tickets.example/jazz"));
    }

    #[tokio::test]
    async fn resolved_records_warm_the_cache_for_the_next_session() {
        let store: Arc<MemoryInfoStore> = Arc::new(MemoryInfoStore::default());
        let config = WidgetConfig::builder()
            .event_data(json!({ "name": "Jazz Night" }))
            .build();
        session(config, "", "", store.clone()).await;

        // A later session with no manual data finds the cached record.
        let later = session(WidgetConfig::default(), "", "", store).await;
        let event = later.event_info();
        assert_eq!(event.source, Source::Cache);
        assert_eq!(event.get("name"), Some("Jazz Night"));
    }

    #[tokio::test]
    async fn update_overlays_and_persists() {
        let store: Arc<MemoryInfoStore> = Arc::new(MemoryInfoStore::default());
        let config = WidgetConfig::builder()
            .event_data(json!({ "name": "Jazz Night" }))
            .build();
        let first = session(config, "", "", store.clone()).await;

        let updated = first.update(
            RecordKind::Event,
            &json!({ "venue": "Blue Note", "promoCode": "SPRING" }),
        );
        assert_eq!(updated.get("name"), Some("Jazz Night"));
        assert_eq!(updated.get("location"), Some("Blue Note"));
        assert_eq!(updated.custom_data["promoCode"], json!("SPRING"));
        assert_eq!(first.event_info(), updated);

        // The overlay survives into a fresh session via the cache.
        let later = session(WidgetConfig::default(), "", "", store).await;
        let event = later.event_info();
        assert_eq!(event.get("location"), Some("Blue Note"));
        assert_eq!(event.custom_data["promoCode"], json!("SPRING"));
    }

    #[tokio::test]
    async fn reads_hand_out_defensive_copies() {
        let config = WidgetConfig::builder()
            .event_data(json!({ "name": "Jazz Night" }))
            .build();
        let session = session(config, "", "", Arc::new(MemoryInfoStore::default())).await;

        let mut copy = session.event_info();
        copy.set("name", "Tampered");
        assert_eq!(session.event_info().get("name"), Some("Jazz Night"));
    }
}
