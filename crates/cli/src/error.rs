use engine_config::error::ConfigError;
use engine_processing::error::{FactoryError, RunFailure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid settings: {0}")]
    Settings(#[from] ConfigError),

    #[error("Failed to set up the export: {0}")]
    Setup(#[from] FactoryError),

    #[error("{0}")]
    Run(#[from] Box<RunFailure>),

    #[error("Failed to write the report: {0}")]
    ReportWrite(#[from] std::io::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}
