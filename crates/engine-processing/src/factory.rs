use crate::{
    error::{FactoryError, RunFailure},
    pipeline::Pipeline,
};
use chrono::{DateTime, Utc};
use connectors::{
    adapter::{Adapter, Location},
    store::{DestinationStore, SourceStore},
};
use engine_config::settings::ExportConfig;
use engine_core::{
    clock::Clock,
    connectors::{
        sink::{file::FileSink, set::SinkSet, table::TableSink},
        source::Scanner,
    },
    context::run::RunContext,
    error::PipelineError,
};
use std::sync::Arc;
use tracing::info;

/// A pipeline ready to run, with the context it will fill in.
pub struct ExportJob {
    pub pipeline: Pipeline,
    pub context: RunContext,
}

impl ExportJob {
    pub async fn run(self) -> Result<RunContext, RunFailure> {
        self.pipeline.run(self.context).await
    }
}

fn open(location: &str) -> Result<(Adapter, String), FactoryError> {
    let parsed: Location = location.parse().map_err(|source| FactoryError::Location {
        location: location.to_string(),
        source,
    })?;
    Ok((Adapter::open(&parsed), parsed.table))
}

/// Builds a job from configuration, resolving store locations through
/// [`Adapter`]. The clock is read once; the run label and the filter
/// threshold both derive from that instant.
pub fn build(config: &ExportConfig, clock: &dyn Clock) -> Result<ExportJob, FactoryError> {
    config.validate()?;
    let now = clock.now();

    let (source, source_table) = open(&config.source)?;
    let destination = match &config.destination {
        Some(location) => {
            let (adapter, table) = open(location)?;
            Some((adapter.destination(), table))
        }
        None => None,
    };

    assemble(config, now, source.source(), source_table, destination)
}

/// Wires already opened stores into a job.
pub fn assemble(
    config: &ExportConfig,
    now: DateTime<Utc>,
    source: Arc<dyn SourceStore>,
    source_table: String,
    destination: Option<(Arc<dyn DestinationStore>, String)>,
) -> Result<ExportJob, FactoryError> {
    config.validate()?;
    let context = RunContext::new(now);

    let mut scanner = Scanner::new(source, source_table, config.page_size()?);
    if let Some(filter) = &config.filter {
        let predicate = filter.predicate(now);
        info!(
            filter = %predicate.expression(),
            threshold = %predicate.threshold,
            "Filtering source records"
        );
        scanner = scanner.with_filter(predicate);
    }

    let mut sinks = SinkSet::new(config.distribution);
    if let Some(dir) = &config.output_dir {
        let sink = FileSink::new(dir.clone(), context.label.clone())
            .with_naming(config.file_naming.clone())
            .with_layout(config.file_layout);
        sinks.register(Arc::new(sink));
    }
    if let Some((store, table)) = destination {
        let sink = TableSink::new(store, table, config.batch_size)
            .map_err(PipelineError::from)?
            .with_policy(config.unprocessed);
        sinks.register(Arc::new(sink));
    }

    Ok(ExportJob {
        pipeline: Pipeline::new(scanner, sinks),
        context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use connectors::memory::MemoryStore;
    use engine_config::settings::{FilterAge, FilterSettings, ThresholdSpec};
    use engine_core::clock::FixedClock;
    use model::{pagination::filter::TimestampFormat, records::record::Record};
    use serde_json::json;

    fn config() -> ExportConfig {
        ExportConfig {
            source: "jsonl://data/profiles".to_string(),
            destination: Some("jsonl://data/copy".to_string()),
            filter: Some(FilterSettings {
                field: "lastModifiedDate".to_string(),
                threshold: ThresholdSpec::Age(FilterAge::days(730)),
                format: TimestampFormat::EpochSeconds,
            }),
            page_size: 2,
            ..ExportConfig::default()
        }
    }

    #[test]
    fn filter_is_fixed_at_build_time() {
        let now = Utc.with_ymd_and_hms(2025, 11, 29, 9, 43, 24).unwrap();
        let job = build(&config(), &FixedClock(now)).unwrap();

        let predicate = job.pipeline.cursor().predicate().unwrap();
        assert_eq!(predicate.field, "lastModifiedDate");
        assert_eq!(predicate.threshold, json!(1701337404));
        assert_eq!(job.context.label, "20251129_0943");
        assert_eq!(job.pipeline.sinks().names(), vec!["table"]);
    }

    #[test]
    fn registers_file_sink_before_table_sink() {
        let config = ExportConfig {
            output_dir: Some("out".into()),
            filter: None,
            ..config()
        };
        let job = build(&config, &FixedClock(Utc::now())).unwrap();
        assert_eq!(job.pipeline.sinks().names(), vec!["files", "table"]);
        assert!(job.pipeline.cursor().predicate().is_none());
    }

    #[test]
    fn rejects_unknown_locations() {
        let config = ExportConfig {
            source: "postgres://db/profiles".to_string(),
            ..config()
        };
        let err = build(&config, &FixedClock(Utc::now())).err().unwrap();
        assert!(matches!(err, FactoryError::Location { .. }));
    }

    #[tokio::test]
    async fn every_page_uses_the_same_threshold() {
        let now = Utc.with_ymd_and_hms(2025, 11, 29, 9, 43, 24).unwrap();
        let store = MemoryStore::new();
        store
            .put_table(
                "profiles",
                (0..6)
                    .map(|i| Record::new().with("id", i).with("lastModifiedDate", 1701337400 + i))
                    .collect(),
            )
            .await;

        let job = assemble(
            &config(),
            now,
            Arc::new(store.clone()),
            "profiles".to_string(),
            Some((Arc::new(store.clone()), "copy".to_string())),
        )
        .unwrap();
        let ctx = job.run().await.unwrap();

        // Only id 5 is newer than the threshold. Pages of 2 over 6 rows take
        // 4 scans, the last one empty.
        assert_eq!(ctx.pages_scanned, 4);
        assert_eq!(ctx.records_scanned, 1);
        let copied: Vec<_> = store
            .table("copy")
            .await
            .iter()
            .map(|r| r.get("id").cloned().unwrap())
            .collect();
        assert_eq!(copied, vec![json!(5)]);
    }
}
