use crate::{
    pagination::{filter::FilterPredicate, token::ContinuationToken},
    records::record::Record,
};
use std::num::NonZeroUsize;

/// One bounded read against a source table.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub location: String,
    pub limit: NonZeroUsize,
    pub filter: Option<FilterPredicate>,
    pub exclusive_start: Option<ContinuationToken>,
}

/// Result of a [`PageRequest`].
///
/// A missing `next` token means the scan is complete. An empty `records` list
/// with a token present only means this page matched nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResponse {
    pub records: Vec<Record>,
    pub next: Option<ContinuationToken>,
}

impl PageResponse {
    pub fn new(records: Vec<Record>, next: Option<ContinuationToken>) -> Self {
        PageResponse { records, next }
    }

    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// A fetched page as handed to sinks.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub index: u64,
    pub records: Vec<Record>,
}

impl Page {
    pub fn new(index: u64, records: Vec<Record>) -> Self {
        Page { index, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
