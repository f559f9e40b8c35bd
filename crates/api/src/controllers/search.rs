//! `GET /search` and the two full-rebuild endpoints (§6). The rebuild
//! endpoints return immediately (202) and run to completion in the
//! background, logging the outcome — matching the spec's "202; starts full
//! rebuild; logs outcome" rather than holding the connection open for what
//! can be a long-running scan.

use crate::context::AppContext;
use axum::extract::{Extension, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use index::SearchResults;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: String,
    #[serde(default)]
    offset: u64,
    #[serde(default = "default_count")]
    count: u64,
}

fn default_count() -> u64 {
    20
}

pub async fn search(
    Extension(ctx): Extension<AppContext>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, crate::error::ApiError> {
    let results = ctx.index().search(&params.q, params.offset, params.count).await?;
    Ok(Json(results))
}

pub async fn reindex_current(Extension(ctx): Extension<AppContext>) -> impl IntoResponse {
    spawn_rebuild(ctx, RebuildTarget::Current);
    StatusCode::ACCEPTED
}

pub async fn reindex_history(Extension(ctx): Extension<AppContext>) -> impl IntoResponse {
    spawn_rebuild(ctx, RebuildTarget::History);
    StatusCode::ACCEPTED
}

enum RebuildTarget {
    Current,
    History,
}

fn spawn_rebuild(ctx: AppContext, target: RebuildTarget) {
    tokio::spawn(async move {
        let schemas = [ctx.schema().book.clone(), ctx.schema().contributor.clone()];
        for schema in schemas {
            let outcome = match target {
                RebuildTarget::Current => {
                    index::reindex_current(ctx.current_scan(), ctx.index(), &schema, ctx.reindex_chunk()).await
                }
                RebuildTarget::History => {
                    index::reindex_history(ctx.history_scan(), ctx.index(), &schema, ctx.reindex_chunk()).await
                }
            };
            match outcome {
                Ok(count) => tracing::info!(schema = %schema, count, "full rebuild finished"),
                Err(error) => tracing::error!(schema = %schema, %error, "full rebuild failed"),
            }
        }
    });
}
