use crate::error::StoreError;
use crate::models::IndexedDocument;
use async_trait::async_trait;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates whatever the store needs before the first write.
    async fn prepare(&self) -> Result<(), StoreError>;

    /// Writes one record, replacing any earlier record with the same id.
    async fn persist(&self, document: &IndexedDocument) -> Result<(), StoreError>;

    /// Every record currently stored.
    async fn load_all(&self) -> Result<Vec<IndexedDocument>, StoreError>;
}

/// Progress after a batch has fully resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub batch: usize,
    pub batches: usize,
    pub documents: usize,
    pub percent: u8,
}

pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: BatchProgress);
}
