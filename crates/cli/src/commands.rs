use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Export a source table to files, a destination table, or both
    Export {
        #[command(flatten)]
        settings: ExportArgs,

        #[arg(
            long,
            help = "If specified, writes the JSON run summary to this file instead of stdout"
        )]
        report: Option<PathBuf>,
    },
    /// Print the merged configuration as JSON without running anything
    ShowConfig {
        #[command(flatten)]
        settings: ExportArgs,
    },
}

/// Settings given on the command line. Flags win over the config file and the
/// environment.
#[derive(Args, Debug, Default, Clone)]
pub struct ExportArgs {
    #[arg(long, help = "JSON config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Env file with TABLEX_* settings (default: ./.env if present)")]
    pub env_file: Option<PathBuf>,

    /// Source table, e.g. jsonl://data/profiles
    #[arg(long)]
    pub source: Option<String>,

    /// Destination table, e.g. jsonl://data/profiles_copy
    #[arg(long)]
    pub destination: Option<String>,

    #[arg(long, help = "Directory to write per-run record files under")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Only export records whose FIELD is newer than the threshold")]
    pub filter_field: Option<String>,

    /// Threshold as an age before now: days, or 2y, 6mo, 3w, 90d, 12h, 30m
    #[arg(long, conflicts_with = "filter_since")]
    pub filter_age: Option<String>,

    /// Threshold as an RFC 3339 instant
    #[arg(long)]
    pub filter_since: Option<String>,

    /// iso8601, epoch_seconds or epoch_millis
    #[arg(long)]
    pub timestamp_format: Option<String>,

    #[arg(long, help = "Records requested per page")]
    pub page_size: Option<usize>,

    #[arg(long, help = "Records per destination batch write")]
    pub batch_size: Option<usize>,

    #[arg(long, value_delimiter = ',', help = "Name files after these record fields")]
    pub key_fields: Option<Vec<String>>,

    #[arg(long, help = "Write one page_<n>.json per page instead of one file per record")]
    pub per_page: bool,

    #[arg(long, help = "Deliver each page to all sinks at once")]
    pub concurrent: bool,

    #[arg(long, help = "Count unprocessed batch items as skipped instead of failing")]
    pub ignore_unprocessed: bool,
}

impl ExportArgs {
    /// The flags that were given, as `(setting key, value)` pairs.
    pub fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value {
                out.push((key, value));
            }
        };

        push("source", self.source.clone());
        push("destination", self.destination.clone());
        push(
            "output_dir",
            self.output_dir.as_ref().map(|p| p.display().to_string()),
        );
        push("filter_field", self.filter_field.clone());
        push("filter_age", self.filter_age.clone());
        push("filter_since", self.filter_since.clone());
        push("timestamp_format", self.timestamp_format.clone());
        push("page_size", self.page_size.map(|n| n.to_string()));
        push("batch_size", self.batch_size.map(|n| n.to_string()));
        push("key_fields", self.key_fields.as_ref().map(|f| f.join(",")));
        push("file_layout", self.per_page.then(|| "per_page".to_string()));
        push("distribution", self.concurrent.then(|| "concurrent".to_string()));
        push("unprocessed", self.ignore_unprocessed.then(|| "ignore".to_string()));

        out
    }
}
