use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Bulk-write batches must hold at least one record.
    #[error("Invalid batch size: {0} (must be at least 1)")]
    InvalidBatchSize(usize),
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Record must be a JSON object, got: {0}")]
    NotAnObject(String),

    #[error("Failed to (de)serialize record: {0}")]
    Json(#[from] serde_json::Error),
}
