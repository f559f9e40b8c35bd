//! PostgreSQL implementation of `HistoryStore`/`CurrentStore` via
//! `sqlx::PgPool`, using runtime-checked queries (§10 — this repo has no
//! live database to check `sqlx::query!` against at build time, so the
//! non-macro half of the same API is used throughout; the SQL text itself
//! is still hand-verified).

use crate::error::StoreError;
use crate::model::{derive_entity_id, CurrentRecord, HistoryRecord};
use crate::traits::{CurrentDocumentScan, CurrentStore, HistoryDocumentScan, HistoryStore, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn history_record_from_row(row: PgRow) -> HistoryRecord {
    HistoryRecord {
        id: row.get("id"),
        version: row.get("version"),
        schema: row.get("schema"),
        history_key: row.get("history_key"),
        classification_key: row.get("classification_key"),
        document: row.get::<sqlx::types::Json<Value>, _>("document").0,
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    #[tracing::instrument(skip(self))]
    async fn lookup_by_history_key(&self, key: &str) -> Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            "select id, version, schema, history_key, classification_key, document \
             from history_documents where history_key = $1",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(rows.into_iter().map(history_record_from_row).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_by_entity(&self, schema: &str, classification_key: &str) -> Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            "select id, version, schema, history_key, classification_key, document \
             from history_documents where schema = $1 and classification_key = $2",
        )
        .bind(schema)
        .bind(classification_key)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(rows.into_iter().map(history_record_from_row).collect())
    }

    #[tracing::instrument(skip(self, record))]
    async fn store(&self, record: HistoryRecord, replace_id: Option<Uuid>) -> Result<HistoryRecord> {
        match replace_id {
            Some(id) => {
                let result = sqlx::query(
                    "update history_documents set version = version + 1, document = $1, \
                     history_key = $2, classification_key = $3, schema = $4, updated_at = now() \
                     where id = $5 and version = $6",
                )
                .bind(sqlx::types::Json(&record.document))
                .bind(&record.history_key)
                .bind(&record.classification_key)
                .bind(&record.schema)
                .bind(id)
                .bind(record.version)
                .execute(&self.pool)
                .await
                .map_err(StoreError::from)?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::Conflict);
                }
                Ok(HistoryRecord {
                    id,
                    version: record.version + 1,
                    ..record
                })
            }
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    "insert into history_documents (id, version, schema, history_key, classification_key, document) \
                     values ($1, 0, $2, $3, $4, $5)",
                )
                .bind(id)
                .bind(&record.schema)
                .bind(&record.history_key)
                .bind(&record.classification_key)
                .bind(sqlx::types::Json(&record.document))
                .execute(&self.pool)
                .await
                .map_err(StoreError::from)?;

                Ok(HistoryRecord {
                    id,
                    version: 0,
                    ..record
                })
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete_many(&self, ids: &[Uuid]) -> Result<()> {
        sqlx::query("delete from history_documents where id = any($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    /// `classification_key` is stored as the same canonical string as
    /// `current_documents.current_key` (both are deterministic functions of
    /// schema + classification), so entity lookups join the two tables on
    /// that shared value rather than needing a second canonicalization.
    #[tracing::instrument(skip(self))]
    async fn get_history_by_entity_id(&self, entity_id: Uuid, schema: &str) -> Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            "select h.id, h.version, h.schema, h.history_key, h.classification_key, h.document \
             from history_documents h \
             join current_documents c on c.schema = h.schema and c.current_key = h.classification_key \
             where c.entity_id = $1 and h.schema = $2",
        )
        .bind(entity_id)
        .bind(schema)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(rows.into_iter().map(history_record_from_row).collect())
    }
}

#[async_trait]
impl HistoryDocumentScan for PgHistoryStore {
    async fn scan_history(&self, schema: &str, after_id: Option<Uuid>, limit: i64) -> Result<Vec<(Uuid, Value)>> {
        let rows = sqlx::query(
            "select id, document from history_documents \
             where schema = $1 and ($2::uuid is null or id > $2) \
             order by id limit $3",
        )
        .bind(schema)
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(rows
            .into_iter()
            .map(|row: PgRow| {
                let id: Uuid = row.get("id");
                let document = row.get::<sqlx::types::Json<Value>, _>("document").0;
                (id, document)
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct PgCurrentStore {
    pool: PgPool,
}

impl PgCurrentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn current_record_from_row(row: PgRow) -> CurrentRecord {
    CurrentRecord {
        id: row.get("id"),
        version: row.get("version"),
        schema: row.get("schema"),
        current_key: row.get("current_key"),
        entity_id: row.get("entity_id"),
        document: row.get::<sqlx::types::Json<Value>, _>("document").0,
    }
}

#[async_trait]
impl CurrentStore for PgCurrentStore {
    #[tracing::instrument(skip(self))]
    async fn lookup_by_current_key(&self, key: &str) -> Result<Vec<CurrentRecord>> {
        let rows = sqlx::query(
            "select id, version, schema, current_key, entity_id, document \
             from current_documents where current_key = $1",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(rows.into_iter().map(current_record_from_row).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, entity_id: Uuid, schema: &str) -> Result<Option<CurrentRecord>> {
        let row = sqlx::query(
            "select id, version, schema, current_key, entity_id, document \
             from current_documents where entity_id = $1 and schema = $2",
        )
        .bind(entity_id)
        .bind(schema)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(row.map(current_record_from_row))
    }

    #[tracing::instrument(skip(self, record))]
    async fn store(&self, mut record: CurrentRecord, replace_id: Option<Uuid>) -> Result<CurrentRecord> {
        if record.entity_id.is_nil() {
            record.entity_id = derive_entity_id(&record.current_key);
        }

        match replace_id {
            Some(id) => {
                let result = sqlx::query(
                    "update current_documents set version = version + 1, document = $1, \
                     current_key = $2, schema = $3, entity_id = $4, updated_at = now() \
                     where id = $5 and version = $6",
                )
                .bind(sqlx::types::Json(&record.document))
                .bind(&record.current_key)
                .bind(&record.schema)
                .bind(record.entity_id)
                .bind(id)
                .bind(record.version)
                .execute(&self.pool)
                .await
                .map_err(StoreError::from)?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::Conflict);
                }
                Ok(CurrentRecord {
                    id,
                    version: record.version + 1,
                    ..record
                })
            }
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    "insert into current_documents (id, version, schema, current_key, entity_id, document) \
                     values ($1, 0, $2, $3, $4, $5)",
                )
                .bind(id)
                .bind(&record.schema)
                .bind(&record.current_key)
                .bind(record.entity_id)
                .bind(sqlx::types::Json(&record.document))
                .execute(&self.pool)
                .await
                .map_err(StoreError::from)?;

                Ok(CurrentRecord {
                    id,
                    version: 0,
                    ..record
                })
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete_many(&self, ids: &[Uuid]) -> Result<()> {
        sqlx::query("delete from current_documents where id = any($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }
}

#[async_trait]
impl CurrentDocumentScan for PgCurrentStore {
    async fn scan_current(&self, schema: &str, after_id: Option<Uuid>, limit: i64) -> Result<Vec<(Uuid, Value)>> {
        let rows = sqlx::query(
            "select id, document from current_documents \
             where schema = $1 and ($2::uuid is null or id > $2) \
             order by id limit $3",
        )
        .bind(schema)
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(rows
            .into_iter()
            .map(|row: PgRow| {
                let id: Uuid = row.get("id");
                let document = row.get::<sqlx::types::Json<Value>, _>("document").0;
                (id, document)
            })
            .collect())
    }
}
