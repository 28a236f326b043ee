use crate::error::StoreError;
use async_trait::async_trait;
use model::{
    pagination::page::{PageRequest, PageResponse},
    records::{batch::DEFAULT_MAX_BATCH_SIZE, record::Record},
};

/// Paged read access to a table.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Reads at most `request.limit` items starting after
    /// `request.exclusive_start`. The limit bounds the items examined, so a
    /// filtered page can come back short or empty while more pages remain.
    async fn scan(&self, request: &PageRequest) -> Result<PageResponse, StoreError>;
}

/// What a bulk write left undone.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchWriteOutput {
    /// Items the store accepted the call for but did not write.
    pub unprocessed: Vec<Record>,
}

impl BatchWriteOutput {
    pub fn complete() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.unprocessed.is_empty()
    }
}

/// Bulk write access to a table. Items within one call are not written
/// atomically.
#[async_trait]
pub trait DestinationStore: Send + Sync {
    /// Largest number of items a single [`batch_write`](Self::batch_write) accepts.
    fn max_batch_size(&self) -> usize {
        DEFAULT_MAX_BATCH_SIZE
    }

    async fn batch_write(
        &self,
        location: &str,
        items: &[Record],
    ) -> Result<BatchWriteOutput, StoreError>;
}
