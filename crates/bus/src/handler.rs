use async_trait::async_trait;
use ingest::{IngestError, Ingestor};

/// What the listener feeds each inbound message to. Scoped to `bus` (rather
/// than reusing `ingest::Ingestor` directly as a concrete type) so the
/// listener can be exercised in tests against a handler that never touches a
/// store.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, content_type: Option<&str>, payload: &[u8]) -> Result<(), IngestError>;
}

#[async_trait]
impl MessageHandler for Ingestor {
    async fn handle(&self, _content_type: Option<&str>, payload: &[u8]) -> Result<(), IngestError> {
        self.ingest(payload).await.map(|_| ())
    }
}
