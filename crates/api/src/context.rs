//! `AppContext` (§6): the dependency-injection bundle shared across every
//! handler via an `axum::Extension`. Grounded on `control::context`'s shape
//! (a `Clone` struct of `Arc`/`PgPool` handles, accessed through getters).

use config_loader::SchemaSettings;
use index::IndexBridge;
use sqlx::PgPool;
use std::sync::Arc;
use store::{CurrentDocumentScan, CurrentStore, HistoryDocumentScan, HistoryStore};

#[derive(Clone)]
pub struct AppContext {
    db: PgPool,
    history: Arc<dyn HistoryStore>,
    current: Arc<dyn CurrentStore>,
    history_scan: Arc<dyn HistoryDocumentScan>,
    current_scan: Arc<dyn CurrentDocumentScan>,
    index: Arc<dyn IndexBridge>,
    schema: SchemaSettings,
    reindex_chunk: i64,
}

impl AppContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: PgPool,
        history: Arc<dyn HistoryStore>,
        current: Arc<dyn CurrentStore>,
        history_scan: Arc<dyn HistoryDocumentScan>,
        current_scan: Arc<dyn CurrentDocumentScan>,
        index: Arc<dyn IndexBridge>,
        schema: SchemaSettings,
        reindex_chunk: i64,
    ) -> Self {
        Self {
            db,
            history,
            current,
            history_scan,
            current_scan,
            index,
            schema,
            reindex_chunk,
        }
    }

    pub fn db(&self) -> &PgPool {
        &self.db
    }

    pub fn history(&self) -> &dyn HistoryStore {
        self.history.as_ref()
    }

    pub fn current(&self) -> &dyn CurrentStore {
        self.current.as_ref()
    }

    pub fn history_scan(&self) -> &dyn HistoryDocumentScan {
        self.history_scan.as_ref()
    }

    pub fn current_scan(&self) -> &dyn CurrentDocumentScan {
        self.current_scan.as_ref()
    }

    pub fn index(&self) -> &dyn IndexBridge {
        self.index.as_ref()
    }

    pub fn schema(&self) -> &SchemaSettings {
        &self.schema
    }

    pub fn reindex_chunk(&self) -> i64 {
        self.reindex_chunk
    }
}
