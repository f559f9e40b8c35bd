//! Chunked full-rebuild scans (§4.8 `reIndexCurrent`/`reIndexHistory`).
//! Single-flighted per target by the caller (§5) — this module only walks
//! the store in pages and pushes each page to the bridge.

use crate::{IndexBridge, IndexError};
use store::{derive_entity_id, CurrentDocumentScan, HistoryDocumentScan};
use uuid::Uuid;

/// Scans `current_documents` for `schema` in pages of `chunk_size` and
/// re-pushes each document to the index, in entity-id order so a restart
/// after a partial failure can resume past `after_id`.
pub async fn reindex_current(
    scan: &dyn CurrentDocumentScan,
    bridge: &dyn IndexBridge,
    schema: &str,
    chunk_size: i64,
) -> Result<u64, IndexError> {
    let mut after: Option<Uuid> = None;
    let mut pushed = 0u64;

    loop {
        let page = scan
            .scan_current(schema, after, chunk_size)
            .await
            .map_err(|_| IndexError::BackendError {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            })?;
        if page.is_empty() {
            break;
        }

        for (id, document) in &page {
            bridge.push_current(*id, document).await?;
            pushed += 1;
        }

        after = page.last().map(|(id, _)| *id);
        if (page.len() as i64) < chunk_size {
            break;
        }
    }

    Ok(pushed)
}

pub async fn reindex_history(
    scan: &dyn HistoryDocumentScan,
    bridge: &dyn IndexBridge,
    schema: &str,
    chunk_size: i64,
) -> Result<u64, IndexError> {
    let mut after: Option<Uuid> = None;
    let mut pushed = 0u64;

    loop {
        let page = scan
            .scan_history(schema, after, chunk_size)
            .await
            .map_err(|_| IndexError::BackendError {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            })?;
        if page.is_empty() {
            break;
        }

        for (id, document) in &page {
            let keys = doc::extract_keys(document, doc::DEFAULT_HISTORY_KEY_EXCLUDED_FIELDS)
                .map_err(|_| IndexError::BackendError {
                    status: reqwest::StatusCode::UNPROCESSABLE_ENTITY,
                })?;
            let entity_id = derive_entity_id(&keys.current_key);
            bridge.push_history(entity_id, document).await?;
            let _ = id;
            pushed += 1;
        }

        after = page.last().map(|(id, _)| *id);
        if (page.len() as i64) < chunk_size {
            break;
        }
    }

    Ok(pushed)
}
