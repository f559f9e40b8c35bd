use super::entity;
use crate::context::AppContext;
use crate::error::ApiError;
use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use ingest::Revision;
use serde_json::Value;

pub async fn show(Extension(ctx): Extension<AppContext>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let id = entity::parse_uuid(&id)?;
    let document = entity::show(&ctx, &ctx.schema().book, id).await?;
    Ok(Json(document))
}

pub async fn history(
    Extension(ctx): Extension<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Revision>>, ApiError> {
    let id = entity::parse_uuid(&id)?;
    let revisions = entity::history(&ctx, &ctx.schema().book, id).await?;
    Ok(Json(revisions))
}

pub async fn reindex(
    Extension(ctx): Extension<AppContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = entity::parse_uuid(&id)?;
    entity::reindex(&ctx, &ctx.schema().book, id).await?;
    Ok(StatusCode::OK)
}
