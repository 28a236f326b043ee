use connectors::error::StoreError;
use engine_config::error::ConfigError;
use engine_core::{context::run::RunContext, error::PipelineError};
use thiserror::Error;

/// A run that stopped on an error, with the counters it had reached.
#[derive(Error, Debug)]
#[error("Run {} failed after {} page(s): {error}", context.label, context.pages_scanned)]
pub struct RunFailure {
    pub context: RunContext,
    #[source]
    pub error: PipelineError,
}

#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot open '{location}': {source}")]
    Location {
        location: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
