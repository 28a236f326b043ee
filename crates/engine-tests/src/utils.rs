use async_trait::async_trait;
use connectors::{
    error::StoreError,
    store::{BatchWriteOutput, DestinationStore, SourceStore},
};
use engine_core::{
    connectors::sink::{Sink, WriteResult},
    error::SinkError,
};
use model::{
    pagination::{
        page::{Page, PageRequest, PageResponse},
        token::ContinuationToken,
    },
    records::record::Record,
};
use std::sync::Mutex;

pub fn token(text: &str) -> ContinuationToken {
    ContinuationToken::from_bytes(text.as_bytes().to_vec())
}

/// A source that serves a fixed script of pages.
///
/// Each call must pass back the token the previous page returned; anything
/// else is rejected, as is a call past the end of the script.
pub struct ScriptedSource {
    pages: Vec<PageResponse>,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedSource {
    pub fn new(pages: Vec<PageResponse>) -> Self {
        ScriptedSource {
            pages,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Pages of `size` generated records, each followed by its token.
    pub fn from_sizes(script: &[(usize, Option<&str>)]) -> Self {
        let mut next_id = 0;
        let pages = script
            .iter()
            .map(|(size, next)| {
                let records = (next_id..next_id + size)
                    .map(|i| crate::profile(i, 1_700_000_000 + i as i64))
                    .collect();
                next_id += size;
                PageResponse::new(records, next.map(token))
            })
            .collect();
        Self::new(pages)
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceStore for ScriptedSource {
    async fn scan(&self, request: &PageRequest) -> Result<PageResponse, StoreError> {
        let mut requests = self.requests.lock().unwrap();
        let call = requests.len();
        requests.push(request.clone());

        let expected = match call {
            0 => None,
            n => self.pages.get(n - 1).and_then(|p| p.next.clone()),
        };
        if request.exclusive_start != expected {
            return Err(StoreError::InvalidToken(format!(
                "call {call}: unexpected resume token"
            )));
        }

        self.pages
            .get(call)
            .cloned()
            .ok_or_else(|| StoreError::Rejected(format!("scan past end of script (call {call})")))
    }
}

/// A destination that refuses every batch.
#[derive(Debug, Default)]
pub struct RejectingDestination {
    attempts: Mutex<usize>,
}

impl RejectingDestination {
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl DestinationStore for RejectingDestination {
    async fn batch_write(
        &self,
        location: &str,
        items: &[Record],
    ) -> Result<BatchWriteOutput, StoreError> {
        *self.attempts.lock().unwrap() += 1;
        Err(StoreError::Rejected(format!(
            "{location}: refusing {} item(s)",
            items.len()
        )))
    }
}

/// A sink that remembers which pages it saw.
pub struct RecordingSink {
    name: String,
    pages: Mutex<Vec<(u64, usize)>>,
}

impl RecordingSink {
    pub fn new(name: &str) -> Self {
        RecordingSink {
            name: name.to_string(),
            pages: Mutex::new(Vec::new()),
        }
    }

    /// `(page index, record count)` per consumed page.
    pub fn pages(&self) -> Vec<(u64, usize)> {
        self.pages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn consume_page(&self, page: &Page) -> Result<WriteResult, SinkError> {
        self.pages.lock().unwrap().push((page.index, page.len()));
        Ok(WriteResult {
            records_written: page.len(),
            ..WriteResult::default()
        })
    }
}
