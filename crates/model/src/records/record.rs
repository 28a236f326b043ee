use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A schema-less item as returned by a store.
///
/// Fields keep the order they were inserted in (the order the store returned
/// them), and that order survives serialization. The pipeline never looks
/// inside a record except for the configured filter field and file-naming keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Record(Map::new())
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical on-disk form: pretty-printed JSON, fields in record order.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, RecordError> {
        Ok(serde_json::to_vec_pretty(&self.0)?)
    }

    /// Single-line JSON, used by line-oriented stores.
    pub fn to_json_line(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(&self.0)?)
    }

    pub fn from_json_slice(data: &[u8]) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_slice(data)?;
        Record::try_from(value)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Record(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Record(map)),
            other => Err(RecordError::NotAnObject(other.to_string())),
        }
    }
}
