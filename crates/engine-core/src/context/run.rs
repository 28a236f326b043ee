use crate::connectors::sink::WriteResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Label format for per-run output directories, e.g. `20250417_1832`.
pub const RUN_LABEL_FORMAT: &str = "%Y%m%d_%H%M";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SinkCounters {
    pub records_written: u64,
    pub batches_written: u64,
}

/// Everything a run accumulates. Only the pipeline mutates it, once per page,
/// and the final value is the run's result.
#[derive(Debug, Clone, Serialize)]
pub struct RunContext {
    pub run_id: String,
    pub label: String,
    pub started_at: DateTime<Utc>,
    pub pages_scanned: u64,
    pub records_scanned: u64,
    pub sinks: BTreeMap<String, SinkCounters>,
    /// Directory the file sink settled on, once it has written anything.
    pub output_dir: Option<PathBuf>,
}

impl RunContext {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        RunContext {
            run_id: uuid::Uuid::new_v4().to_string(),
            label: started_at.format(RUN_LABEL_FORMAT).to_string(),
            started_at,
            pages_scanned: 0,
            records_scanned: 0,
            sinks: BTreeMap::new(),
            output_dir: None,
        }
    }

    pub fn record_page(&mut self, records: usize) {
        self.pages_scanned += 1;
        self.records_scanned += records as u64;
    }

    pub fn record_write(&mut self, sink: &str, result: &WriteResult) {
        let counters = self.sinks.entry(sink.to_string()).or_default();
        counters.records_written += result.records_written as u64;
        counters.batches_written += result.batches_written as u64;

        if let Some(dir) = &result.output_dir {
            self.output_dir = Some(dir.clone());
        }
    }

    /// Counts records a failing sink managed to write before it stopped, and
    /// keeps the directory it had created, if any.
    pub fn record_partial_write(&mut self, sink: &str, records: usize, output_dir: Option<&Path>) {
        self.sinks.entry(sink.to_string()).or_default().records_written += records as u64;

        if let Some(dir) = output_dir {
            self.output_dir = Some(dir.to_path_buf());
        }
    }

    pub fn sink(&self, sink: &str) -> SinkCounters {
        self.sinks.get(sink).copied().unwrap_or_default()
    }

    pub fn records_written(&self) -> u64 {
        self.sinks.values().map(|c| c.records_written).sum()
    }
}
