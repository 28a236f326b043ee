use crate::error::ConfigError;
use engine_core::connectors::sink::{
    file::{FileLayout, FileNaming},
    set::DistributionMode,
    table::UnprocessedPolicy,
};
use model::records::batch::DEFAULT_MAX_BATCH_SIZE;
use serde::{Deserialize, Serialize};
use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

pub mod overrides;
pub mod threshold;

pub use threshold::{DEFAULT_FILTER_AGE, FilterAge, FilterSettings, ThresholdSpec};

pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Everything one export run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Source table location, e.g. `jsonl://data/profiles`.
    pub source: String,
    pub destination: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub filter: Option<FilterSettings>,
    pub page_size: usize,
    pub batch_size: usize,
    pub file_naming: FileNaming,
    pub file_layout: FileLayout,
    pub unprocessed: UnprocessedPolicy,
    pub distribution: DistributionMode,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            source: String::new(),
            destination: None,
            output_dir: None,
            filter: None,
            page_size: DEFAULT_PAGE_SIZE,
            batch_size: DEFAULT_MAX_BATCH_SIZE,
            file_naming: FileNaming::default(),
            file_layout: FileLayout::default(),
            unprocessed: UnprocessedPolicy::default(),
            distribution: DistributionMode::default(),
        }
    }
}

impl ExportConfig {
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&source)
    }

    pub fn page_size(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.page_size).ok_or(ConfigError::InvalidPageSize(self.page_size))
    }

    /// Checks the settings a run cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.trim().is_empty() {
            return Err(ConfigError::MissingSource);
        }
        if self.destination.is_none() && self.output_dir.is_none() {
            return Err(ConfigError::NoSink);
        }
        self.page_size()?;
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }
        if let Some(filter) = &self.filter
            && filter.field.trim().is_empty()
        {
            return Err(ConfigError::EmptyFilterField);
        }
        if let FileNaming::KeyFields(fields) = &self.file_naming
            && fields.is_empty()
        {
            return Err(ConfigError::EmptyKeyFields);
        }
        Ok(())
    }
}
