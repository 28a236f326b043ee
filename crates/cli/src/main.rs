use crate::{commands::Commands, error::CliError};
use clap::Parser;
use engine_config::report::summary::RunSummary;
use engine_core::clock::SystemClock;
use engine_processing::factory;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod env;
mod error;
mod output;

#[derive(Parser)]
#[command(name = "tablex", version, about = "Paginated table export tool")]
struct Cli {
    #[arg(short, long, global = true, help = "Log at debug level")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Logs go to stderr so stdout carries only the JSON report.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Export { settings, report } => {
            let config = config::load(&settings)?;
            info!(source = %config.source, "Loaded export configuration");

            let job = factory::build(&config, &SystemClock)?;
            match job.run().await {
                Ok(ctx) => {
                    output::emit(&RunSummary::done(&ctx), report.as_deref()).await?;
                }
                Err(failure) => {
                    let summary = RunSummary::failed(&failure.context, &failure.error);
                    if let Err(e) = output::emit(&summary, report.as_deref()).await {
                        error!(error = %e, "Could not emit the run summary");
                    }
                    return Err(CliError::Run(Box::new(failure)));
                }
            }
        }
        Commands::ShowConfig { settings } => {
            let config = config::load(&settings)?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
    }

    Ok(())
}
