//! DOM provider: heuristic scraping of the page snapshot.

use super::{InfoProvider, ProviderError, fill_page_fields};
use crate::record::{Record, Source};
use crate::schema::{FieldSpec, RecordSchema, SelectorCatalog};
use async_trait::async_trait;
use log::debug;
use meetway_rs_dom::{Element, PageSnapshot, Selector};
use std::sync::Arc;

/// Scans the selector catalog per field against the page snapshot.
/// Purely derived from the document; never mutates it.
pub struct DomProvider {
    schema: &'static RecordSchema,
    page: Arc<PageSnapshot>,
    catalog: SelectorCatalog,
}

impl DomProvider {
    /// Create a provider over a snapshot with the effective catalog.
    pub fn new(
        schema: &'static RecordSchema,
        page: Arc<PageSnapshot>,
        catalog: SelectorCatalog,
    ) -> Self {
        Self {
            schema,
            page,
            catalog,
        }
    }

    /// Scan one field's selector list in list order.
    ///
    /// A selector that fails to parse is skipped so it cannot block the
    /// rest of the list; a matching element that yields nothing also
    /// falls through to the next selector.
    fn extract_field(&self, spec: &FieldSpec) -> Option<String> {
        for selector in self.catalog.selectors(spec.name) {
            let parsed = match Selector::parse(selector) {
                Ok(parsed) => parsed,
                Err(err) => {
                    debug!("skipping selector {selector:?} for field {}: {err}", spec.name);
                    continue;
                }
            };
            let Some(element) = self.page.document().query_first(&parsed) else {
                continue;
            };
            if let Some(value) = extract_value(spec, &element) {
                return Some(value);
            }
        }
        None
    }
}

/// Value of a matched element: field data-attributes first, then a form
/// value for input-like elements, then rendered text.
fn extract_value(spec: &FieldSpec, element: &Element<'_>) -> Option<String> {
    for attr in spec.data_attrs {
        if let Some(value) = element.attr(attr) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    if let Some(value) = element.form_value() {
        let value = value.trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    let text = element.text();
    if text.is_empty() { None } else { Some(text) }
}

#[async_trait]
impl InfoProvider for DomProvider {
    fn source(&self) -> Source {
        Source::Dom
    }

    async fn resolve(&self) -> Result<Option<Record>, ProviderError> {
        let mut record = Record::empty(self.schema, Source::Dom);
        let mut found = false;
        for field in self.schema.fields {
            if field.page.is_some() {
                continue;
            }
            if let Some(value) = self.extract_field(field) {
                record.set(field.name, value);
                found = true;
            }
        }
        if !found {
            return Ok(None);
        }
        fill_page_fields(&mut record, self.schema, &self.page);
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::DomProvider;
    use crate::providers::InfoProvider;
    use crate::schema::{EVENT_V1, SelectorCatalog, USER_V1};
    use meetway_rs_dom::PageSnapshot;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn event_provider(html: &str) -> DomProvider {
        event_provider_with(html, HashMap::new())
    }

    fn event_provider_with(html: &str, overrides: HashMap<String, Vec<String>>) -> DomProvider {
        let page = Arc::new(PageSnapshot::new("https://tickets.example/jazz", html));
        DomProvider::new(&EVENT_V1, page, SelectorCatalog::new(&EVENT_V1, &overrides))
    }

    #[tokio::test]
    async fn scrapes_event_fields_from_markup() {
        let html = r#"
            <title>Jazz Tickets</title>
            <h1>Jazz Night</h1>
            <time datetime="2025-05-01">May 1st</time>
            <span class="venue">Blue Note</span>
            <span class="price">25 EUR</span>
        "#;
        let record = event_provider(html)
            .resolve()
            .await
            .expect("resolve")
            .expect("record");
        assert_eq!(record.get("name"), Some("Jazz Night"));
        // The datetime attribute is preferred over the rendered text.
        assert_eq!(record.get("date"), Some("2025-05-01"));
        assert_eq!(record.get("location"), Some("Blue Note"));
        assert_eq!(record.get("price"), Some("25 EUR"));
        assert_eq!(record.get("url"), Some("https://tickets.example/jazz"));
        assert_eq!(record.get("pageTitle"), Some("Jazz Tickets"));
    }

    #[tokio::test]
    async fn first_selector_in_list_wins() {
        // "h1" precedes ".event-title" in the catalog, whatever the page order.
        let html = r#"<div class="event-title">Wrong</div><h1>Jazz Night</h1>"#;
        let record = event_provider(html)
            .resolve()
            .await
            .expect("resolve")
            .expect("record");
        assert_eq!(record.get("name"), Some("Jazz Night"));
    }

    #[tokio::test]
    async fn override_replaces_default_list() {
        let html = r#"<h1>Wrong</h1><div class="headliner">Jazz Night</div>"#;
        let mut overrides = HashMap::new();
        overrides.insert("name".to_string(), vec![".headliner".to_string()]);
        let record = event_provider_with(html, overrides)
            .resolve()
            .await
            .expect("resolve")
            .expect("record");
        assert_eq!(record.get("name"), Some("Jazz Night"));
    }

    #[tokio::test]
    async fn malformed_selector_does_not_block_the_list() {
        let html = r#"<h1>Jazz Night</h1>"#;
        let mut overrides = HashMap::new();
        overrides.insert(
            "name".to_string(),
            vec!["div > p".to_string(), "h1".to_string()],
        );
        let record = event_provider_with(html, overrides)
            .resolve()
            .await
            .expect("resolve")
            .expect("record");
        assert_eq!(record.get("name"), Some("Jazz Night"));
    }

    #[tokio::test]
    async fn empty_page_is_no_data() {
        assert!(event_provider("").resolve().await.expect("resolve").is_none());
        // A page with only unmatched markup is no data either.
        assert!(
            event_provider("<footer>contact us</footer>")
                .resolve()
                .await
                .expect("resolve")
                .is_none()
        );
    }

    #[tokio::test]
    async fn user_fields_read_inputs_and_data_attrs() {
        let html = r#"
            <input type="email" value="a@b.example">
            <span data-user-id="u-42">Profile</span>
        "#;
        let page = Arc::new(PageSnapshot::new("https://tickets.example", html));
        let provider = DomProvider::new(
            &USER_V1,
            page,
            SelectorCatalog::new(&USER_V1, &HashMap::new()),
        );
        let record = provider.resolve().await.expect("resolve").expect("record");
        assert_eq!(record.get("email"), Some("a@b.example"));
        assert_eq!(record.get("id"), Some("u-42"));
    }
}
