//! In-memory fakes implementing the same traits as the PostgreSQL stores,
//! so pipeline-level tests (in the `ingest` crate) can exercise the full
//! Ingestor without a database (§13).

use crate::error::StoreError;
use crate::model::{derive_entity_id, CurrentRecord, HistoryRecord};
use crate::traits::{CurrentDocumentScan, CurrentStore, HistoryDocumentScan, HistoryStore, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: Mutex<Vec<HistoryRecord>>,
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn lookup_by_history_key(&self, key: &str) -> Result<Vec<HistoryRecord>> {
        let records = self.records.lock().expect("lock poisoned");
        Ok(records
            .iter()
            .filter(|r| r.history_key == key)
            .cloned()
            .collect())
    }

    async fn fetch_by_entity(&self, schema: &str, classification_key: &str) -> Result<Vec<HistoryRecord>> {
        let records = self.records.lock().expect("lock poisoned");
        Ok(records
            .iter()
            .filter(|r| r.schema == schema && r.classification_key == classification_key)
            .cloned()
            .collect())
    }

    async fn store(&self, mut record: HistoryRecord, replace_id: Option<Uuid>) -> Result<HistoryRecord> {
        let mut records = self.records.lock().expect("lock poisoned");
        match replace_id {
            Some(id) => {
                let existing = records
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or(StoreError::Conflict)?;
                if existing.version != record.version {
                    return Err(StoreError::Conflict);
                }
                record.id = id;
                record.version += 1;
                *existing = record.clone();
                Ok(record)
            }
            None => {
                record.id = Uuid::new_v4();
                record.version = 0;
                records.push(record.clone());
                Ok(record)
            }
        }
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<()> {
        let mut records = self.records.lock().expect("lock poisoned");
        records.retain(|r| !ids.contains(&r.id));
        Ok(())
    }

    async fn get_history_by_entity_id(&self, entity_id: Uuid, schema: &str) -> Result<Vec<HistoryRecord>> {
        let records = self.records.lock().expect("lock poisoned");
        Ok(records
            .iter()
            .filter(|r| r.schema == schema && derive_entity_id(&r.classification_key) == entity_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl HistoryDocumentScan for InMemoryHistoryStore {
    async fn scan_history(&self, schema: &str, after_id: Option<Uuid>, limit: i64) -> Result<Vec<(Uuid, Value)>> {
        let records = self.records.lock().expect("lock poisoned");
        let mut matching: Vec<_> = records
            .iter()
            .filter(|r| r.schema == schema && after_id.map_or(true, |after| r.id > after))
            .collect();
        matching.sort_by_key(|r| r.id);
        Ok(matching
            .into_iter()
            .take(limit as usize)
            .map(|r| (r.id, r.document.clone()))
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryCurrentStore {
    records: Mutex<Vec<CurrentRecord>>,
}

#[async_trait]
impl CurrentStore for InMemoryCurrentStore {
    async fn lookup_by_current_key(&self, key: &str) -> Result<Vec<CurrentRecord>> {
        let records = self.records.lock().expect("lock poisoned");
        Ok(records
            .iter()
            .filter(|r| r.current_key == key)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, entity_id: Uuid, schema: &str) -> Result<Option<CurrentRecord>> {
        let records = self.records.lock().expect("lock poisoned");
        Ok(records
            .iter()
            .find(|r| r.entity_id == entity_id && r.schema == schema)
            .cloned())
    }

    async fn store(&self, mut record: CurrentRecord, replace_id: Option<Uuid>) -> Result<CurrentRecord> {
        if record.entity_id.is_nil() {
            record.entity_id = derive_entity_id(&record.current_key);
        }

        let mut records = self.records.lock().expect("lock poisoned");
        match replace_id {
            Some(id) => {
                let existing = records
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or(StoreError::Conflict)?;
                if existing.version != record.version {
                    return Err(StoreError::Conflict);
                }
                record.id = id;
                record.version += 1;
                *existing = record.clone();
                Ok(record)
            }
            None => {
                record.id = Uuid::new_v4();
                record.version = 0;
                records.push(record.clone());
                Ok(record)
            }
        }
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<()> {
        let mut records = self.records.lock().expect("lock poisoned");
        records.retain(|r| !ids.contains(&r.id));
        Ok(())
    }
}

#[async_trait]
impl CurrentDocumentScan for InMemoryCurrentStore {
    async fn scan_current(&self, schema: &str, after_id: Option<Uuid>, limit: i64) -> Result<Vec<(Uuid, Value)>> {
        let records = self.records.lock().expect("lock poisoned");
        let mut matching: Vec<_> = records
            .iter()
            .filter(|r| r.schema == schema && after_id.map_or(true, |after| r.id > after))
            .collect();
        matching.sort_by_key(|r| r.id);
        Ok(matching
            .into_iter()
            .take(limit as usize)
            .map(|r| (r.id, r.document.clone()))
            .collect())
    }
}
