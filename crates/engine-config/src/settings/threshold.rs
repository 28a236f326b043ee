use crate::error::ConfigError;
use chrono::{DateTime, Months, TimeDelta, Utc};
use model::pagination::filter::{FilterPredicate, TimestampFormat};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::debug;

/// How far back the filter threshold lies.
///
/// Parsed from a bare number of days (`"730"`) or a number with a unit:
/// `y` (calendar years), `mo` (calendar months), `w`, `d`, `h`, `m` (minutes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterAge {
    Months(u32),
    Minutes(i64),
}

impl FilterAge {
    pub fn days(days: u32) -> Self {
        FilterAge::Minutes(i64::from(days) * 24 * 60)
    }

    /// The instant `self` before `now`.
    pub fn before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            FilterAge::Months(months) => now
                .checked_sub_months(Months::new(months))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            FilterAge::Minutes(minutes) => TimeDelta::try_minutes(minutes)
                .and_then(|delta| now.checked_sub_signed(delta))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

impl FromStr for FilterAge {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let split = raw
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(raw.len());
        let (digits, unit) = raw.split_at(split);

        let n: u32 = digits
            .parse()
            .map_err(|_| ConfigError::InvalidAge(s.to_string()))?;
        let minutes = |per: i64| FilterAge::Minutes(i64::from(n) * per);

        match unit.trim() {
            "" | "d" => Ok(minutes(24 * 60)),
            "y" => n
                .checked_mul(12)
                .map(FilterAge::Months)
                .ok_or_else(|| ConfigError::InvalidAge(s.to_string())),
            "mo" => Ok(FilterAge::Months(n)),
            "w" => Ok(minutes(7 * 24 * 60)),
            "h" => Ok(minutes(60)),
            "m" => Ok(minutes(1)),
            _ => Err(ConfigError::InvalidAge(s.to_string())),
        }
    }
}

impl TryFrom<String> for FilterAge {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for FilterAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterAge::Months(m) if m % 12 == 0 => write!(f, "{}y", m / 12),
            FilterAge::Months(m) => write!(f, "{m}mo"),
            FilterAge::Minutes(m) if m % (24 * 60) == 0 => write!(f, "{}d", m / (24 * 60)),
            FilterAge::Minutes(m) if m % 60 == 0 => write!(f, "{}h", m / 60),
            FilterAge::Minutes(m) => write!(f, "{m}m"),
        }
    }
}

impl From<FilterAge> for String {
    fn from(age: FilterAge) -> Self {
        age.to_string()
    }
}

/// Where the filter threshold comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdSpec {
    /// Relative to the run's start time.
    Age(FilterAge),
    /// A fixed instant.
    Since(DateTime<Utc>),
}

impl ThresholdSpec {
    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            ThresholdSpec::Age(age) => age.before(now),
            ThresholdSpec::Since(at) => *at,
        }
    }
}

/// `field > threshold` filter settings.
///
/// In config files the threshold is an optional `age` or `since` key next to
/// `field`; with neither, [`DEFAULT_FILTER_AGE`] applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilterSettings", into = "RawFilterSettings")]
pub struct FilterSettings {
    pub field: String,
    pub threshold: ThresholdSpec,
    pub format: TimestampFormat,
}

/// Age used when a filter field is given without a threshold.
pub const DEFAULT_FILTER_AGE: FilterAge = FilterAge::Months(24);

#[derive(Serialize, Deserialize)]
struct RawFilterSettings {
    field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    age: Option<FilterAge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    since: Option<DateTime<Utc>>,
    #[serde(default)]
    format: TimestampFormat,
}

impl TryFrom<RawFilterSettings> for FilterSettings {
    type Error = ConfigError;

    fn try_from(raw: RawFilterSettings) -> Result<Self, Self::Error> {
        let threshold = match (raw.age, raw.since) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidValue {
                    key: "filter".to_string(),
                    message: "set either age or since, not both".to_string(),
                });
            }
            (Some(age), None) => ThresholdSpec::Age(age),
            (None, Some(at)) => ThresholdSpec::Since(at),
            (None, None) => ThresholdSpec::Age(DEFAULT_FILTER_AGE),
        };

        Ok(FilterSettings {
            field: raw.field,
            threshold,
            format: raw.format,
        })
    }
}

impl From<FilterSettings> for RawFilterSettings {
    fn from(settings: FilterSettings) -> Self {
        let (age, since) = match settings.threshold {
            ThresholdSpec::Age(age) => (Some(age), None),
            ThresholdSpec::Since(at) => (None, Some(at)),
        };
        RawFilterSettings {
            field: settings.field,
            age,
            since,
            format: settings.format,
        }
    }
}

impl FilterSettings {
    pub fn new(field: impl Into<String>) -> Self {
        FilterSettings {
            field: field.into(),
            threshold: ThresholdSpec::Age(DEFAULT_FILTER_AGE),
            format: TimestampFormat::default(),
        }
    }

    /// Resolves the threshold against `now`. Call once per run.
    pub fn predicate(&self, now: DateTime<Utc>) -> FilterPredicate {
        let since = self.threshold.resolve(now);
        debug!(
            field = %self.field,
            %since,
            format = ?self.format,
            "Resolved filter threshold"
        );
        FilterPredicate::newer_than(self.field.clone(), since, self.format)
    }
}
