//! `ApiError` (§7/§9): the HTTP layer's single error type, mapping every
//! failure from `store`/`index`/`ingest` onto a status code and a small JSON
//! body. Grounded on the teacher's `control::error::AppError`/`ErrorWrapper`/
//! `ProblemDetails` shape, trimmed of the JSON:API envelope this surface
//! doesn't use, and given an explicit `code` field since the spec names
//! specific codes (`InvalidUUID`) rather than leaving them to the title text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no record found")]
    NotFound,
    #[error("path segment is not a valid UUID")]
    InvalidUuid,
    #[error(transparent)]
    Store(#[from] store::StoreError),
    #[error(transparent)]
    Index(#[from] index::IndexError),
    #[error(transparent)]
    Ingest(#[from] ingest::IngestError),
    #[error(transparent)]
    Merge(#[from] doc::MergeError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::InvalidUuid => (StatusCode::BAD_REQUEST, "InvalidUUID"),
            ApiError::Store(store::StoreError::NotFound) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "StoreError"),
            ApiError::Index(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IndexError"),
            ApiError::Ingest(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IngestError"),
            ApiError::Merge(_) => (StatusCode::INTERNAL_SERVER_ERROR, "MergeError"),
            ApiError::Other(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        // No body leakage on 5xx: the client gets the code, not the
        // underlying error's text.
        let message = if status.is_server_error() {
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { code, message })).into_response()
    }
}
