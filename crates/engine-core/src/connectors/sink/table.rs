use crate::{
    connectors::sink::{Sink, WriteResult},
    error::SinkError,
};
use async_trait::async_trait;
use connectors::store::DestinationStore;
use model::{error::BatchError, pagination::page::Page, records::batch};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Instant};
use tracing::{debug, warn};

/// What to do when a bulk write reports items it did not process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnprocessedPolicy {
    /// Treat the batch as failed.
    #[default]
    Fail,
    /// Log and carry on; only processed items are counted.
    Ignore,
}

/// Writes pages to a destination table through bulk writes.
///
/// Batches of one page go out one at a time, in page order. Batches already
/// written stay written if a later one fails.
pub struct TableSink {
    name: String,
    destination: Arc<dyn DestinationStore>,
    location: String,
    max_batch_size: usize,
    policy: UnprocessedPolicy,
}

impl TableSink {
    pub fn new(
        destination: Arc<dyn DestinationStore>,
        location: impl Into<String>,
        max_batch_size: usize,
    ) -> Result<Self, BatchError> {
        if max_batch_size == 0 {
            return Err(BatchError::InvalidBatchSize(max_batch_size));
        }

        let store_max = destination.max_batch_size();
        let max_batch_size = if max_batch_size > store_max {
            warn!(
                requested = max_batch_size,
                store_max, "Batch size exceeds the destination limit; capping"
            );
            store_max
        } else {
            max_batch_size
        };

        Ok(TableSink {
            name: "table".to_string(),
            destination,
            location: location.into(),
            max_batch_size,
            policy: UnprocessedPolicy::default(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_policy(mut self, policy: UnprocessedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}

#[async_trait]
impl Sink for TableSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn consume_page(&self, page: &Page) -> Result<WriteResult, SinkError> {
        let start = Instant::now();
        let batches = batch::split(&page.records, self.max_batch_size)?;

        let mut records_written = 0usize;
        let mut batches_written = 0usize;

        for batch in batches {
            let size = batch.len();
            let output = self
                .destination
                .batch_write(&self.location, batch.records())
                .await
                .map_err(|source| SinkError::Batch {
                    batch_index: batch.index(),
                    size,
                    records_written,
                    source,
                })?;

            if !output.is_complete() {
                match self.policy {
                    UnprocessedPolicy::Fail => {
                        return Err(SinkError::Unprocessed {
                            batch_index: batch.index(),
                            size,
                            records_written,
                            unprocessed: output.unprocessed,
                        });
                    }
                    UnprocessedPolicy::Ignore => {
                        warn!(
                            sink = %self.name,
                            page = page.index,
                            batch = batch.index(),
                            unprocessed = output.unprocessed.len(),
                            "Destination left items unprocessed"
                        );
                    }
                }
            }

            records_written += size - output.unprocessed.len().min(size);
            batches_written += 1;
        }

        debug!(
            sink = %self.name,
            table = %self.location,
            page = page.index,
            records = records_written,
            batches = batches_written,
            duration_ms = start.elapsed().as_millis(),
            "Wrote page to table"
        );

        Ok(WriteResult {
            records_written,
            batches_written,
            duration: start.elapsed(),
            output_dir: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::memory::{InjectedFailure, MemoryStore};
    use model::records::record::Record;

    fn page(index: u64, n: usize) -> Page {
        Page::new(index, (0..n).map(|i| Record::new().with("id", i)).collect())
    }

    #[tokio::test]
    async fn writes_batches_in_page_order() {
        let store = MemoryStore::new();
        let sink = TableSink::new(Arc::new(store.clone()), "copy", 25).unwrap();

        let result = sink.consume_page(&page(0, 120)).await.unwrap();
        assert_eq!(result.records_written, 120);
        assert_eq!(result.batches_written, 5);
        assert_eq!(store.batch_sizes("copy").await, vec![25, 25, 25, 25, 20]);
        assert_eq!(store.table("copy").await, page(0, 120).records);
    }

    #[tokio::test]
    async fn empty_page_issues_no_writes() {
        let store = MemoryStore::new();
        let sink = TableSink::new(Arc::new(store.clone()), "copy", 25).unwrap();

        let result = sink.consume_page(&page(0, 0)).await.unwrap();
        assert_eq!(result, WriteResult { duration: result.duration, ..WriteResult::default() });
        assert!(store.batch_sizes("copy").await.is_empty());
    }

    #[tokio::test]
    async fn failed_batch_keeps_earlier_batches() {
        let store = MemoryStore::new();
        store.fail_write_at(2, InjectedFailure::Unavailable).await;
        let sink = TableSink::new(Arc::new(store.clone()), "copy", 25).unwrap();

        let err = sink.consume_page(&page(3, 80)).await.unwrap_err();
        match &err {
            SinkError::Batch {
                batch_index,
                size,
                records_written,
                ..
            } => {
                assert_eq!(*batch_index, 2);
                assert_eq!(*size, 25);
                assert_eq!(*records_written, 50);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.records_written(), 50);
        assert_eq!(store.table("copy").await.len(), 50);
    }

    #[tokio::test]
    async fn unprocessed_items_fail_the_batch_by_default() {
        let store = MemoryStore::new();
        store.leave_unprocessed(2).await;
        let sink = TableSink::new(Arc::new(store.clone()), "copy", 10).unwrap();

        let err = sink.consume_page(&page(0, 30)).await.unwrap_err();
        assert!(matches!(
            err,
            SinkError::Unprocessed { batch_index: 0, size: 10, .. }
        ));
        assert_eq!(err.records_written(), 8);
    }

    #[tokio::test]
    async fn unprocessed_items_can_be_tolerated() {
        let store = MemoryStore::new();
        store.leave_unprocessed(1).await;
        let sink = TableSink::new(Arc::new(store.clone()), "copy", 10)
            .unwrap()
            .with_policy(UnprocessedPolicy::Ignore);

        let result = sink.consume_page(&page(0, 30)).await.unwrap();
        assert_eq!(result.batches_written, 3);
        assert_eq!(result.records_written, 27);
    }

    #[test]
    fn zero_batch_size_is_invalid() {
        let err = TableSink::new(Arc::new(MemoryStore::new()), "copy", 0).err();
        assert_eq!(err, Some(BatchError::InvalidBatchSize(0)));
    }

    #[test]
    fn batch_size_is_capped_at_the_store_limit() {
        let store = MemoryStore::new().with_max_batch_size(10);
        let sink = TableSink::new(Arc::new(store), "copy", 25).unwrap();
        assert_eq!(sink.max_batch_size(), 10);
    }
}
