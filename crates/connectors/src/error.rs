use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or failed transiently.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the request as malformed.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Invalid continuation token: {0}")]
    InvalidToken(String),

    #[error("Batch of {got} item(s) exceeds the store limit of {max}")]
    BatchTooLarge { got: usize, max: usize },

    #[error("Malformed item at line {line}: {message}")]
    MalformedItem { line: usize, message: String },

    #[error("Unsupported location: {0}")]
    UnsupportedLocation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the failure is about reaching the store rather than about the
    /// request itself.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Io(_))
    }
}
