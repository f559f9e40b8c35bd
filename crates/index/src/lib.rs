//! The Index bridge (§4.8): pushes current documents into the search
//! backend and supports chunked full rebuilds.

mod error;
mod http;
mod reindex;

pub use error::IndexError;
pub use http::HttpIndexBridge;
pub use reindex::{reindex_current, reindex_history};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub entity_id: Uuid,
    pub document: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub last_page: bool,
}

/// Accepts whole current documents and forwards them to the search backend
/// keyed by entity id. Index-push failures never fail the ingest pipeline
/// (§4.6 step 13) — callers log and move on.
#[async_trait]
pub trait IndexBridge: Send + Sync {
    async fn push_current(&self, entity_id: Uuid, document: &serde_json::Value) -> Result<(), IndexError>;

    async fn push_history(&self, entity_id: Uuid, document: &serde_json::Value) -> Result<(), IndexError>;

    async fn search(&self, query: &str, offset: u64, count: u64) -> Result<SearchResults, IndexError>;
}
