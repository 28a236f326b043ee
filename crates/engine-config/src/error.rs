use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No source table configured")]
    MissingSource,

    #[error("Nothing to export to: configure a destination table, an output directory, or both")]
    NoSink,

    #[error("Page size must be at least 1, got {0}")]
    InvalidPageSize(usize),

    #[error("Batch size must be at least 1, got {0}")]
    InvalidBatchSize(usize),

    #[error("Invalid filter age '{0}': expected a number of days or a value like 2y, 6mo, 3w, 90d, 12h, 30m")]
    InvalidAge(String),

    #[error("Filter field name is empty")]
    EmptyFilterField,

    #[error("Key-field file naming needs at least one field")]
    EmptyKeyFields,

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
