use crate::error::StoreError;
use crate::model::{CurrentRecord, HistoryRecord};
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistent set of annotated per-source documents (§4.4).
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Every stored document whose history key equals `key`. Expected size
    /// 0 or 1 under I2; more is a repair case.
    async fn lookup_by_history_key(&self, key: &str) -> Result<Vec<HistoryRecord>>;

    /// All per-source documents contributing to one entity.
    async fn fetch_by_entity(&self, schema: &str, classification_key: &str) -> Result<Vec<HistoryRecord>>;

    /// Replaces `replace_id` if given, else inserts `record` as new.
    async fn store(&self, record: HistoryRecord, replace_id: Option<Uuid>) -> Result<HistoryRecord>;

    /// Idempotent removal by opaque id.
    async fn delete_many(&self, ids: &[Uuid]) -> Result<()>;

    /// Retrieval for the revisions view.
    async fn get_history_by_entity_id(&self, entity_id: Uuid, schema: &str) -> Result<Vec<HistoryRecord>>;
}

/// Persistent set of merged entity documents (§4.5).
#[async_trait]
pub trait CurrentStore: Send + Sync {
    async fn lookup_by_current_key(&self, key: &str) -> Result<Vec<CurrentRecord>>;

    async fn get_by_id(&self, entity_id: Uuid, schema: &str) -> Result<Option<CurrentRecord>>;

    /// Replace-by-id when a prior version exists, insert otherwise.
    async fn store(&self, record: CurrentRecord, replace_id: Option<Uuid>) -> Result<CurrentRecord>;

    /// I3 repair, analogous to `HistoryStore::delete_many`.
    async fn delete_many(&self, ids: &[Uuid]) -> Result<()>;
}

/// Narrow view `index` needs for chunked full rebuilds, without depending
/// on the rest of either store's surface.
#[async_trait]
pub trait CurrentDocumentScan: Send + Sync {
    async fn scan_current(&self, schema: &str, after_id: Option<Uuid>, limit: i64) -> Result<Vec<(Uuid, Value)>>;
}

#[async_trait]
pub trait HistoryDocumentScan: Send + Sync {
    async fn scan_history(&self, schema: &str, after_id: Option<Uuid>, limit: i64) -> Result<Vec<(Uuid, Value)>>;
}
