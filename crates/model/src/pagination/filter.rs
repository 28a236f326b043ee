use crate::records::record::Record;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// How a store expects timestamps to be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// RFC 3339 in UTC with millisecond precision, e.g. `2023-11-30T09:43:24.495Z`.
    #[default]
    Iso8601,
    EpochSeconds,
    EpochMillis,
}

impl TimestampFormat {
    pub fn render(&self, at: DateTime<Utc>) -> Value {
        match self {
            TimestampFormat::Iso8601 => {
                Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            TimestampFormat::EpochSeconds => Value::from(at.timestamp()),
            TimestampFormat::EpochMillis => Value::from(at.timestamp_millis()),
        }
    }
}

/// Scan filter of the form `field > threshold`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPredicate {
    pub field: String,
    pub threshold: Value,
}

impl FilterPredicate {
    pub fn greater_than(field: impl Into<String>, threshold: impl Into<Value>) -> Self {
        FilterPredicate {
            field: field.into(),
            threshold: threshold.into(),
        }
    }

    /// Keeps records whose `field` is newer than `since`, rendered in the
    /// store's timestamp representation.
    pub fn newer_than(field: impl Into<String>, since: DateTime<Utc>, format: TimestampFormat) -> Self {
        FilterPredicate::greater_than(field, format.render(since))
    }

    /// Expression text with the threshold as a placeholder, in the shape scan
    /// APIs take it.
    pub fn expression(&self) -> String {
        format!("{} > :threshold", self.field)
    }

    /// Evaluates the predicate the way a store-side scan filter does: numbers
    /// compare numerically, strings lexicographically, and a missing field or
    /// a type mismatch never matches.
    pub fn matches(&self, record: &Record) -> bool {
        let Some(value) = record.get(&self.field) else {
            return false;
        };

        let ordering = match (value, &self.threshold) {
            (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
            (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
            _ => None,
        };

        ordering == Some(Ordering::Greater)
    }
}
