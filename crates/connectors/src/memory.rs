//! In-process tables with the same scan semantics as a real store, plus hooks
//! for injecting failures.

use crate::{
    error::StoreError,
    file::jsonl::{decode_offset, encode_offset},
    store::{BatchWriteOutput, DestinationStore, SourceStore},
};
use async_trait::async_trait;
use model::{
    pagination::page::{PageRequest, PageResponse},
    records::{batch::DEFAULT_MAX_BATCH_SIZE, record::Record},
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    Unavailable,
    Rejected,
}

impl InjectedFailure {
    fn into_error(self, what: &str) -> StoreError {
        match self {
            InjectedFailure::Unavailable => StoreError::Unavailable(format!("injected: {what}")),
            InjectedFailure::Rejected => StoreError::Rejected(format!("injected: {what}")),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    tables: HashMap<String, Vec<Record>>,
    scan_calls: usize,
    batch_sizes: HashMap<String, Vec<usize>>,
    fail_scan_at: Option<(usize, InjectedFailure)>,
    fail_write_at: Option<(usize, InjectedFailure)>,
    unprocessed_per_write: usize,
    writes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
    max_batch_size: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = Some(max);
        self
    }

    pub async fn put_table(&self, name: &str, records: Vec<Record>) {
        self.inner
            .lock()
            .await
            .tables
            .insert(name.to_string(), records);
    }

    pub async fn table(&self, name: &str) -> Vec<Record> {
        self.inner
            .lock()
            .await
            .tables
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn scan_calls(&self) -> usize {
        self.inner.lock().await.scan_calls
    }

    /// Sizes of every successful batch write against `table`, in call order.
    pub async fn batch_sizes(&self, table: &str) -> Vec<usize> {
        self.inner
            .lock()
            .await
            .batch_sizes
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes the `n`-th scan call (0-based) fail.
    pub async fn fail_scan_at(&self, n: usize, failure: InjectedFailure) {
        self.inner.lock().await.fail_scan_at = Some((n, failure));
    }

    /// Makes the `n`-th batch write (0-based, across all tables) fail.
    pub async fn fail_write_at(&self, n: usize, failure: InjectedFailure) {
        self.inner.lock().await.fail_write_at = Some((n, failure));
    }

    /// Every batch write leaves its last `count` items unprocessed.
    pub async fn leave_unprocessed(&self, count: usize) {
        self.inner.lock().await.unprocessed_per_write = count;
    }
}

#[async_trait]
impl SourceStore for MemoryStore {
    async fn scan(&self, request: &PageRequest) -> Result<PageResponse, StoreError> {
        let mut inner = self.inner.lock().await;
        let call = inner.scan_calls;
        inner.scan_calls += 1;

        if let Some((n, failure)) = inner.fail_scan_at
            && n == call
        {
            return Err(failure.into_error("scan"));
        }

        let offset = match &request.exclusive_start {
            Some(token) => decode_offset(token)?,
            None => 0,
        };

        let rows = inner
            .tables
            .get(&request.location)
            .ok_or_else(|| StoreError::TableNotFound(request.location.clone()))?;

        let limit = request.limit.get();
        let examined: Vec<&Record> = rows.iter().skip(offset).take(limit).collect();
        let next = (examined.len() == limit).then(|| encode_offset(offset + limit));

        let records = examined
            .into_iter()
            .filter(|r| request.filter.as_ref().is_none_or(|f| f.matches(r)))
            .cloned()
            .collect();

        Ok(PageResponse::new(records, next))
    }
}

#[async_trait]
impl DestinationStore for MemoryStore {
    fn max_batch_size(&self) -> usize {
        self.max_batch_size.unwrap_or(DEFAULT_MAX_BATCH_SIZE)
    }

    async fn batch_write(
        &self,
        location: &str,
        items: &[Record],
    ) -> Result<BatchWriteOutput, StoreError> {
        let max = self.max_batch_size();
        if items.len() > max {
            return Err(StoreError::BatchTooLarge {
                got: items.len(),
                max,
            });
        }

        let mut inner = self.inner.lock().await;
        let call = inner.writes;
        inner.writes += 1;

        if let Some((n, failure)) = inner.fail_write_at
            && n == call
        {
            return Err(failure.into_error("batch write"));
        }

        let keep = items.len().saturating_sub(inner.unprocessed_per_write);
        let (written, unprocessed) = items.split_at(keep);

        inner
            .tables
            .entry(location.to_string())
            .or_default()
            .extend(written.iter().cloned());
        inner
            .batch_sizes
            .entry(location.to_string())
            .or_default()
            .push(items.len());

        Ok(BatchWriteOutput {
            unprocessed: unprocessed.to_vec(),
        })
    }
}
