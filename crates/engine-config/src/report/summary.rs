use chrono::{DateTime, Utc};
use engine_core::context::run::{RunContext, SinkCounters};
use serde::Serialize;
use std::{collections::BTreeMap, fmt::Display, path::PathBuf};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Done,
    Failed,
}

/// Final report of a run, as printed or written by the CLI.
#[derive(Serialize, Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub label: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub pages_scanned: u64,
    pub records_scanned: u64,
    pub records_written: u64,
    pub sinks: BTreeMap<String, SinkCounters>,
    pub output_dir: Option<PathBuf>,
}

impl RunSummary {
    pub fn done(ctx: &RunContext) -> Self {
        Self::build(ctx, RunStatus::Done, None)
    }

    pub fn failed(ctx: &RunContext, error: &impl Display) -> Self {
        Self::build(ctx, RunStatus::Failed, Some(error.to_string()))
    }

    fn build(ctx: &RunContext, status: RunStatus, error: Option<String>) -> Self {
        RunSummary {
            run_id: ctx.run_id.clone(),
            label: ctx.label.clone(),
            status,
            error,
            started_at: ctx.started_at,
            pages_scanned: ctx.pages_scanned,
            records_scanned: ctx.records_scanned,
            records_written: ctx.records_written(),
            sinks: ctx.sinks.clone(),
            output_dir: ctx.output_dir.clone(),
        }
    }
}
