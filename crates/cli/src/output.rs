use crate::error::CliError;
use engine_config::report::summary::RunSummary;
use std::path::Path;

fn generate_report_json(summary: &RunSummary) -> Result<String, CliError> {
    let json = serde_json::to_string_pretty(summary)?;
    Ok(json)
}

pub async fn write_report(summary: &RunSummary, path: &Path) -> Result<(), CliError> {
    let report_json = generate_report_json(summary)?;
    tokio::fs::write(path, report_json).await?;
    Ok(())
}

pub fn print_report(summary: &RunSummary) -> Result<(), CliError> {
    let report_json = generate_report_json(summary)?;
    println!("{report_json}");
    Ok(())
}

/// Writes the summary to `path` if given, stdout otherwise.
pub async fn emit(summary: &RunSummary, path: Option<&Path>) -> Result<(), CliError> {
    match path {
        Some(path) => write_report(summary, path).await,
        None => print_report(summary),
    }
}
