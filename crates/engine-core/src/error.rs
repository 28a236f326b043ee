use connectors::error::StoreError;
use model::{error::BatchError, records::record::Record};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to prepare output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write record {position} of page {page} to {}: {source}", path.display())]
    Record {
        page: u64,
        /// Index of the record within its page; also the number of records of
        /// this page already written.
        position: usize,
        path: PathBuf,
        record: Box<Record>,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize record {position} of page {page}: {source}")]
    Serialize {
        page: u64,
        position: usize,
        /// Run directory the record was headed for.
        dir: PathBuf,
        record: Box<Record>,
        #[source]
        source: model::error::RecordError,
    },

    #[error("Batch {batch_index} ({size} item(s)) was rejected by the destination: {source}")]
    Batch {
        batch_index: usize,
        size: usize,
        /// Records of this page written by earlier batches.
        records_written: usize,
        #[source]
        source: StoreError,
    },

    #[error("Batch {batch_index}: destination left {} of {size} item(s) unprocessed", unprocessed.len())]
    Unprocessed {
        batch_index: usize,
        size: usize,
        records_written: usize,
        unprocessed: Vec<Record>,
    },

    #[error(transparent)]
    InvalidBatchSize(#[from] BatchError),
}

impl SinkError {
    /// Records of the failing page that reached the sink before the error.
    pub fn records_written(&self) -> usize {
        match self {
            SinkError::Record { position, .. } => *position,
            SinkError::Batch {
                records_written, ..
            } => *records_written,
            SinkError::Unprocessed {
                records_written,
                size,
                unprocessed,
                ..
            } => records_written + size.saturating_sub(unprocessed.len()),
            SinkError::OutputDir { .. }
            | SinkError::Serialize { .. }
            | SinkError::InvalidBatchSize(_) => 0,
        }
    }

    /// Run directory a file sink had already created when it failed.
    pub fn output_dir(&self) -> Option<&Path> {
        match self {
            SinkError::Record { path, .. } => path.parent(),
            SinkError::Serialize { dir, .. } => Some(dir),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source '{location}' is unavailable: {source}")]
    SourceUnavailable {
        location: String,
        #[source]
        source: StoreError,
    },

    #[error("Source '{location}' rejected the scan request: {source}")]
    SourceRequestRejected {
        location: String,
        #[source]
        source: StoreError,
    },

    #[error("Sink '{sink}' failed on page {page}: {source}")]
    SinkWriteFailed {
        sink: String,
        page: u64,
        #[source]
        source: SinkError,
    },

    #[error("Invalid batch size: {0} (must be at least 1)")]
    InvalidBatchSize(usize),
}

impl PipelineError {
    /// Classifies a store failure raised while scanning.
    pub fn from_scan(location: &str, source: StoreError) -> Self {
        let location = location.to_string();
        if source.is_transient() {
            PipelineError::SourceUnavailable { location, source }
        } else {
            PipelineError::SourceRequestRejected { location, source }
        }
    }

    pub fn from_sink(sink: &str, page: u64, source: SinkError) -> Self {
        match source {
            SinkError::InvalidBatchSize(BatchError::InvalidBatchSize(size)) => {
                PipelineError::InvalidBatchSize(size)
            }
            source => PipelineError::SinkWriteFailed {
                sink: sink.to_string(),
                page,
                source,
            },
        }
    }
}

impl From<BatchError> for PipelineError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::InvalidBatchSize(size) => PipelineError::InvalidBatchSize(size),
        }
    }
}
