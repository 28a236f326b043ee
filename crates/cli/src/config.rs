use crate::{commands::ExportArgs, env::EnvManager, error::CliError};
use engine_config::settings::ExportConfig;
use std::path::Path;
use tracing::debug;

const DEFAULT_ENV_FILE: &str = ".env";

/// Merges defaults, the config file, `TABLEX_*` variables and flags, in that
/// order of precedence.
pub fn load(args: &ExportArgs) -> Result<ExportConfig, CliError> {
    let mut env = EnvManager::new();
    match &args.env_file {
        Some(path) => env.load_from_file(path)?,
        None if Path::new(DEFAULT_ENV_FILE).is_file() => env.load_from_file(DEFAULT_ENV_FILE)?,
        None => {}
    }
    merge(args, &env)
}

pub fn merge(args: &ExportArgs, env: &EnvManager) -> Result<ExportConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => ExportConfig::from_json_file(path)?,
        None => ExportConfig::default(),
    };

    for (key, value) in env.overrides() {
        debug!(key, "Setting from environment");
        config.set(key, value)?;
    }
    for (key, value) in args.overrides() {
        config.set(key, &value)?;
    }

    Ok(config)
}
