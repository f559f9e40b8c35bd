//! Persistence layer (§10): `HistoryStore`/`CurrentStore` traits, a
//! PostgreSQL implementation, and in-memory fakes for pipeline tests.

mod error;
mod memory;
mod model;
mod postgres;
mod traits;

pub use error::StoreError;
pub use memory::{InMemoryCurrentStore, InMemoryHistoryStore};
pub use model::{derive_entity_id, CurrentRecord, HistoryRecord, ENTITY_ID_NAMESPACE};
pub use postgres::{PgCurrentStore, PgHistoryStore};
pub use traits::{CurrentDocumentScan, CurrentStore, HistoryDocumentScan, HistoryStore, Result};
