use crate::{
    error::ConfigError,
    settings::{ExportConfig, FilterSettings, ThresholdSpec},
};
use chrono::{DateTime, Utc};
use engine_core::connectors::sink::file::FileNaming;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;

/// Keys understood by [`ExportConfig::set`].
pub const KEYS: &[&str] = &[
    "source",
    "destination",
    "output_dir",
    "filter_field",
    "filter_age",
    "filter_since",
    "timestamp_format",
    "page_size",
    "batch_size",
    "key_fields",
    "file_layout",
    "unprocessed",
    "distribution",
];

fn invalid(key: &str, message: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Parses a unit enum variant from its snake_case name.
fn parse_variant<T: DeserializeOwned>(key: &str, value: &str) -> Result<T, ConfigError> {
    serde_json::from_value(Value::String(value.trim().to_string())).map_err(|e| invalid(key, e))
}

fn parse_size(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|e| invalid(key, e))
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl ExportConfig {
    /// Applies one textual setting, as read from the environment or a flag.
    /// Later calls win over earlier ones.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "source" => self.source = value.trim().to_string(),
            "destination" => self.destination = optional(value),
            "output_dir" => self.output_dir = optional(value).map(PathBuf::from),
            "filter_field" => self.filter_mut().field = value.trim().to_string(),
            "filter_age" => self.filter_mut().threshold = ThresholdSpec::Age(value.parse()?),
            "filter_since" => {
                let at = DateTime::parse_from_rfc3339(value.trim())
                    .map_err(|e| invalid(key, e))?
                    .with_timezone(&Utc);
                self.filter_mut().threshold = ThresholdSpec::Since(at);
            }
            "timestamp_format" => self.filter_mut().format = parse_variant(key, value)?,
            "page_size" => self.page_size = parse_size(key, value)?,
            "batch_size" => self.batch_size = parse_size(key, value)?,
            "key_fields" => {
                let fields: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(String::from)
                    .collect();
                self.file_naming = if fields.is_empty() {
                    FileNaming::Sequence
                } else {
                    FileNaming::KeyFields(fields)
                };
            }
            "file_layout" => self.file_layout = parse_variant(key, value)?,
            "unprocessed" => self.unprocessed = parse_variant(key, value)?,
            "distribution" => self.distribution = parse_variant(key, value)?,
            _ => return Err(invalid(key, "unknown setting")),
        }
        Ok(())
    }

    fn filter_mut(&mut self) -> &mut FilterSettings {
        self.filter.get_or_insert_with(|| FilterSettings::new(""))
    }
}
