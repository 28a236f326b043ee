use crate::error::SinkError;
use async_trait::async_trait;
use model::pagination::page::Page;
use std::{path::PathBuf, time::Duration};

pub mod file;
pub mod set;
pub mod table;

/// A destination for fetched pages.
///
/// Sinks do not share state with each other; a failure in one never undoes
/// what another has written.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Name the run counters are keyed by.
    fn name(&self) -> &str;

    async fn consume_page(&self, page: &Page) -> Result<WriteResult, SinkError>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteResult {
    pub records_written: usize,
    pub batches_written: usize,
    pub duration: Duration,
    /// Where a file-based sink put its output.
    pub output_dir: Option<PathBuf>,
}
