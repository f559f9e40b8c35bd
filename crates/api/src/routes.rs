//! Route table (§6). Grounded on `control::routes`/`controllers::mod`'s
//! route-per-file shape, translated from axum 0.4's `AddExtensionLayer` to
//! 0.7's `Extension` layer.

use crate::context::AppContext;
use crate::controllers;
use crate::cors::cors_layer;
use axum::http::header::{CACHE_CONTROL, VARY};
use axum::http::HeaderValue;
use axum::routing::{get, put};
use axum::{Extension, Router};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/books/:id", get(controllers::book::show))
        .route("/books/:id/history", get(controllers::book::history))
        .route("/books/:id/reindex", put(controllers::book::reindex))
        .route("/contributors/:id", get(controllers::contributor::show))
        .route("/contributors/:id/history", get(controllers::contributor::history))
        .route("/contributors/:id/reindex", put(controllers::contributor::reindex))
        .route("/search", get(controllers::search::search))
        .route("/search/reindex/current", put(controllers::search::reindex_current))
        .route("/search/reindex/history", put(controllers::search::reindex_history))
        .route("/health", get(controllers::health_check::show))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::appending(
            VARY,
            HeaderValue::from_static("accept, accept-encoding"),
        ))
        .layer(Extension(ctx))
}
