//! The Ingestor (§4.6): orchestrates the full pipeline for one message,
//! wiring the pure `doc` transformations to `store`'s `HistoryStore`/
//! `CurrentStore` and `index`'s `IndexBridge`.

use crate::error::IngestError;
use doc::{extract_keys, reduce_all, DEFAULT_HISTORY_KEY_EXCLUDED_FIELDS};
use index::IndexBridge;
use serde_json::Value;
use std::sync::Arc;
use store::{derive_entity_id, CurrentRecord, CurrentStore, HistoryRecord, HistoryStore};
use uuid::Uuid;

/// Everything the pipeline needs to run one message to completion. Held
/// behind `Arc` (rather than borrowed) so the bus listener can clone one
/// instance into each `tokio::spawn`ed worker task.
#[derive(Clone)]
pub struct Ingestor {
    pub history: Arc<dyn HistoryStore>,
    pub current: Arc<dyn CurrentStore>,
    pub index: Arc<dyn IndexBridge>,
    pub history_key_excluded_fields: Vec<String>,
}

impl Ingestor {
    pub fn new(history: Arc<dyn HistoryStore>, current: Arc<dyn CurrentStore>, index: Arc<dyn IndexBridge>) -> Self {
        Self {
            history,
            current,
            index,
            history_key_excluded_fields: DEFAULT_HISTORY_KEY_EXCLUDED_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    #[tracing::instrument(skip(self, payload))]
    pub async fn ingest(&self, payload: &[u8]) -> Result<CurrentRecord, IngestError> {
        // 1. Parse.
        let raw: Value = serde_json::from_slice(payload).map_err(IngestError::MalformedJson)?;

        // 2. Annotate.
        let annotated = doc::annotate(raw)?;

        // 3. Extract keys.
        let excluded: Vec<&str> = self.history_key_excluded_fields.iter().map(String::as_str).collect();
        let keys = extract_keys(&annotated, &excluded)?;
        tracing::info!(
            schema = %keys.schema,
            history_key = %keys.history_key,
            current_key = %keys.current_key,
            "extracted keys"
        );

        // 4. Lookup.
        let matches = self.history.lookup_by_history_key(&keys.history_key).await?;

        // 5. Normalize for replace.
        let replace_id = matches.first().map(|m| m.id);
        let replace_version = matches.first().map(|m| m.version).unwrap_or(0);

        // 6. Repair I2: drop every match beyond the first.
        if matches.len() > 1 {
            let stale: Vec<Uuid> = matches[1..].iter().map(|m| m.id).collect();
            tracing::warn!(count = stale.len(), history_key = %keys.history_key, "repairing duplicate history records");
            self.history.delete_many(&stale).await?;
        }

        // 7. Store in HistoryStore. `classification_key` mirrors
        // `current_key` (see DESIGN.md) so entity-scoped reads can join the
        // two tables on one shared string.
        let record = HistoryRecord {
            id: replace_id.unwrap_or(Uuid::nil()),
            version: replace_version,
            schema: keys.schema.clone(),
            history_key: keys.history_key.clone(),
            classification_key: keys.current_key.clone(),
            document: annotated,
        };
        self.history.store(record, replace_id).await?;

        // 8. Fetch every per-source document for the entity.
        let history = self.history.fetch_by_entity(&keys.schema, &keys.current_key).await?;
        if history.is_empty() {
            return Err(IngestError::EmptyHistory);
        }

        // 9. Merge. Store-internal id/version never enter the document
        // body in this crate's data model, so there is nothing to strip
        // from the reduction's result.
        let merged = reduce_all(history.into_iter().map(|r| r.document).collect())?;

        // 10. Lookup current.
        let cur_matches = self.current.lookup_by_current_key(&keys.current_key).await?;

        // 11. Normalize + repair current (I3), mirroring steps 5-6.
        let cur_replace_id = cur_matches.first().map(|m| m.id);
        let cur_replace_version = cur_matches.first().map(|m| m.version).unwrap_or(0);
        if cur_matches.len() > 1 {
            let stale: Vec<Uuid> = cur_matches[1..].iter().map(|m| m.id).collect();
            tracing::warn!(count = stale.len(), current_key = %keys.current_key, "repairing duplicate current records");
            self.current.delete_many(&stale).await?;
        }

        // 12. Store in CurrentStore.
        let entity_id = cur_matches
            .first()
            .map(|m| m.entity_id)
            .unwrap_or_else(|| derive_entity_id(&keys.current_key));
        let current_record = CurrentRecord {
            id: cur_replace_id.unwrap_or(Uuid::nil()),
            version: cur_replace_version,
            schema: keys.schema.clone(),
            current_key: keys.current_key.clone(),
            entity_id,
            document: merged,
        };
        let stored = self.current.store(current_record, cur_replace_id).await?;

        // 13. Notify the index bridge. Best-effort: logged, never fatal.
        if let Err(err) = self.index.push_current(stored.entity_id, &stored.document).await {
            tracing::warn!(entity_id = %stored.entity_id, error = %err, "index push failed after successful ingest");
        }

        Ok(stored)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use index::{IndexError, SearchResults};
    use serde_json::json;
    use std::sync::Mutex;
    use store::{InMemoryCurrentStore, InMemoryHistoryStore};

    #[derive(Default)]
    struct FakeIndex {
        pushed: Mutex<Vec<(Uuid, Value)>>,
    }

    #[async_trait]
    impl IndexBridge for FakeIndex {
        async fn push_current(&self, entity_id: Uuid, document: &Value) -> Result<(), IndexError> {
            self.pushed.lock().unwrap().push((entity_id, document.clone()));
            Ok(())
        }
        async fn push_history(&self, _entity_id: Uuid, _document: &Value) -> Result<(), IndexError> {
            Ok(())
        }
        async fn search(&self, _query: &str, _offset: u64, _count: u64) -> Result<SearchResults, IndexError> {
            Ok(SearchResults { hits: vec![], last_page: true })
        }
    }

    fn message(system: &str, processed_at: &str, title: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "$schema": "book.v2",
            "classification": [{"realm": "isbn", "id": "9780000000001"}],
            "source": {"system": system, "processedAt": processed_at, "role": "publisher"},
            "title": title,
        }))
        .unwrap()
    }

    fn fixture() -> (Arc<InMemoryHistoryStore>, Arc<InMemoryCurrentStore>, Arc<FakeIndex>, Ingestor) {
        let history = Arc::new(InMemoryHistoryStore::default());
        let current = Arc::new(InMemoryCurrentStore::default());
        let index = Arc::new(FakeIndex::default());
        let ingestor = Ingestor::new(history.clone(), current.clone(), index.clone());
        (history, current, index, ingestor)
    }

    #[tokio::test]
    async fn single_source_first_ingest() {
        let (_history, _current, index, ingestor) = fixture();

        let stored = ingestor
            .ingest(&message("sA", "2020-01-01T00:00:00Z", "Alpha"))
            .await
            .unwrap();

        assert_eq!(stored.document["title"]["value"], json!("Alpha"));
        assert_eq!(index.pushed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn two_sources_non_overlapping_fields_both_survive() {
        let (_history, _current, _index, ingestor) = fixture();

        ingestor.ingest(&message("sA", "2020-01-01T00:00:00Z", "Alpha")).await.unwrap();

        // `system`/`processedAt` are both stripped from the history key (§4.3), so a
        // second, genuinely distinct upstream must differ in `role` instead — matching
        // `system` here would collapse onto sA's history key and replace it.
        let mut second = serde_json::from_slice::<Value>(&message("sB", "2020-01-02T00:00:00Z", "Alpha")).unwrap();
        second["source"]["role"] = json!("distributor");
        second.as_object_mut().unwrap().remove("title");
        second["subtitle"] = json!("An Introduction");
        let stored = ingestor.ingest(&serde_json::to_vec(&second).unwrap()).await.unwrap();

        assert_eq!(stored.document["title"]["value"], json!("Alpha"));
        assert_eq!(stored.document["subtitle"]["value"], json!("An Introduction"));
    }

    #[tokio::test]
    async fn later_source_wins_on_overlapping_field() {
        let (_history, _current, _index, ingestor) = fixture();

        ingestor.ingest(&message("sA", "2020-01-01T00:00:00Z", "Alpha")).await.unwrap();
        let stored = ingestor.ingest(&message("sB", "2020-01-02T00:00:00Z", "Alpha!")).await.unwrap();

        assert_eq!(stored.document["title"]["value"], json!("Alpha!"));
    }

    #[tokio::test]
    async fn resend_same_payload_new_timestamp_replaces_history_not_current() {
        let (history, _current, _index, ingestor) = fixture();

        ingestor.ingest(&message("sA", "2020-01-01T00:00:00Z", "Alpha")).await.unwrap();
        ingestor.ingest(&message("sA", "2021-06-01T00:00:00Z", "Alpha")).await.unwrap();

        let keys = extract_keys(
            &doc::annotate(serde_json::from_slice(&message("sA", "2021-06-01T00:00:00Z", "Alpha")).unwrap()).unwrap(),
            DEFAULT_HISTORY_KEY_EXCLUDED_FIELDS,
        )
        .unwrap();
        let records = history.fetch_by_entity(&keys.schema, &keys.current_key).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn history_repair_restores_i2_and_recomputes_current() {
        let (history, current, index, _ingestor) = fixture();

        let seed = doc::annotate(serde_json::from_slice(&message("sA", "2020-01-01T00:00:00Z", "Alpha")).unwrap()).unwrap();
        let keys = extract_keys(&seed, DEFAULT_HISTORY_KEY_EXCLUDED_FIELDS).unwrap();

        history
            .store(
                HistoryRecord {
                    id: Uuid::nil(),
                    version: 0,
                    schema: keys.schema.clone(),
                    history_key: keys.history_key.clone(),
                    classification_key: keys.current_key.clone(),
                    document: seed.clone(),
                },
                None,
            )
            .await
            .unwrap();
        history
            .store(
                HistoryRecord {
                    id: Uuid::nil(),
                    version: 0,
                    schema: keys.schema.clone(),
                    history_key: keys.history_key.clone(),
                    classification_key: keys.current_key.clone(),
                    document: seed,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(history.lookup_by_history_key(&keys.history_key).await.unwrap().len(), 2);

        let ingestor = Ingestor::new(history.clone(), current, index);
        ingestor.ingest(&message("sA", "2022-01-01T00:00:00Z", "Alpha")).await.unwrap();

        assert_eq!(history.lookup_by_history_key(&keys.history_key).await.unwrap().len(), 1);
    }
}
