//! The HTTP surface (§6): axum routes over the `store`/`index`/`ingest`
//! crates, grounded on the teacher's `control` crate (`error`, `cors`,
//! `context`, `routes`/`controllers`).

mod context;
mod controllers;
mod cors;
mod error;
mod routes;

pub use context::AppContext;
pub use error::ApiError;
pub use routes::router;
