use doc::{AnnotateError, KeyError, MergeError};

/// Whether a failure should be dead-lettered or retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Permanent,
    Temporary,
}

/// The union of every way a single message can fail to be ingested.
///
/// Variants map 1:1 onto the disposition table: the pure, content-derived
/// failures (`Annotate`, `Key`, `Merge`, `MalformedJson`) are always
/// permanent; the store/index boundary failures are temporary except
/// `IndexFailure`, which is logged but never fails the message.
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("payload is not valid JSON")]
    MalformedJson(#[source] serde_json::Error),

    #[error(transparent)]
    Annotate(#[from] AnnotateError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("history store produced no documents for an entity immediately after storing one")]
    EmptyHistory,

    #[error("store operation timed out")]
    StoreTimeout,

    #[error("could not reach the store")]
    ConnectionFailure,

    #[error("optimistic concurrency conflict on store")]
    StoreConflict,

    #[error("search backend push failed")]
    IndexFailure,
}

impl IngestError {
    /// `IndexFailure` is swallowed at step 13 before the pipeline ever
    /// returns to a caller, so it never reaches this method in practice;
    /// it's classified `Permanent` only so the match stays exhaustive.
    pub fn disposition(&self) -> Disposition {
        match self {
            IngestError::StoreTimeout | IngestError::ConnectionFailure | IngestError::StoreConflict => {
                Disposition::Temporary
            }
            IngestError::IndexFailure
            | IngestError::MalformedJson(_)
            | IngestError::Annotate(_)
            | IngestError::Key(_)
            | IngestError::Merge(_)
            | IngestError::EmptyHistory => Disposition::Permanent,
        }
    }
}

impl From<store::StoreError> for IngestError {
    fn from(err: store::StoreError) -> Self {
        match err {
            store::StoreError::Timeout => IngestError::StoreTimeout,
            store::StoreError::ConnectionFailure(_) | store::StoreError::Other(_) => {
                IngestError::ConnectionFailure
            }
            store::StoreError::Conflict => IngestError::StoreConflict,
            store::StoreError::NotFound => IngestError::EmptyHistory,
        }
    }
}
