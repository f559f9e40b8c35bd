//! Shared body behind the `/books/*` and `/contributors/*` routes (§6): the
//! two surfaces differ only in which schema they read, so the handlers in
//! `book.rs`/`contributor.rs` are thin wrappers over these functions.

use crate::context::AppContext;
use crate::error::ApiError;
use ingest::Revision;
use serde_json::Value;
use uuid::Uuid;

pub async fn show(ctx: &AppContext, schema: &str, entity_id: Uuid) -> Result<Value, ApiError> {
    ctx.current()
        .get_by_id(entity_id, schema)
        .await?
        .map(|record| record.document)
        .ok_or(ApiError::NotFound)
}

pub async fn history(ctx: &AppContext, schema: &str, entity_id: Uuid) -> Result<Vec<Revision>, ApiError> {
    let records = ctx.history().get_history_by_entity_id(entity_id, schema).await?;
    if records.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(ingest::revisions(records)?)
}

pub async fn reindex(ctx: &AppContext, schema: &str, entity_id: Uuid) -> Result<(), ApiError> {
    let record = ctx.current().get_by_id(entity_id, schema).await?.ok_or(ApiError::NotFound)?;
    ctx.index().push_current(record.entity_id, &record.document).await?;
    Ok(())
}

pub fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidUuid)
}
