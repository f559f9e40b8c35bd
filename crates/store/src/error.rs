//! `StoreError` is the only error type the `ingest` crate sees from either
//! store: `sqlx::Error` is classified at this boundary so retry logic
//! upstream never has to match on it directly (§10).

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store operation timed out")]
    Timeout,
    #[error("could not reach the store")]
    ConnectionFailure(#[source] sqlx::Error),
    #[error("optimistic concurrency conflict on replace")]
    Conflict,
    #[error("no record found")]
    NotFound,
    #[error("store error: {0}")]
    Other(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::PoolTimedOut => StoreError::Timeout,
            sqlx::Error::Io(_) | sqlx::Error::PoolClosed => StoreError::ConnectionFailure(err),
            _ => StoreError::Other(err),
        }
    }
}
