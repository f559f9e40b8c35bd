//! The Ingestor (§4.6) and Revisions view (§4.7): the orchestration layer
//! wiring the pure `doc` transformations to `store` and `index`.

mod error;
mod pipeline;
mod revisions;

pub use error::{Disposition, IngestError};
pub use pipeline::Ingestor;
pub use revisions::{revisions, Revision};
