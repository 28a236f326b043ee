use crate::{
    error::StoreError,
    file::jsonl::JsonlStore,
    store::{DestinationStore, SourceStore},
};
use std::{fmt, path::PathBuf, str::FromStr, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Jsonl,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// A parsed table location.
///
/// Accepted forms:
/// - `jsonl://<dir>/<table>`
/// - `<dir>/<table>.jsonl`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub kind: StoreKind,
    pub root: PathBuf,
    pub table: String,
}

impl FromStr for Location {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = if let Some(rest) = s.strip_prefix("jsonl://") {
            (StoreKind::Jsonl, rest)
        } else if let Some(rest) = s.strip_suffix(".jsonl") {
            (StoreKind::Jsonl, rest)
        } else {
            return Err(StoreError::UnsupportedLocation(s.to_string()));
        };

        let rest = rest.strip_suffix(".jsonl").unwrap_or(rest);
        let (root, table) = match rest.rsplit_once('/') {
            Some((root, table)) => (PathBuf::from(if root.is_empty() { "/" } else { root }), table),
            None => (PathBuf::from("."), rest),
        };

        if table.is_empty() {
            return Err(StoreError::UnsupportedLocation(format!(
                "{s}: missing table name"
            )));
        }

        Ok(Location {
            kind,
            root,
            table: table.to_string(),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.kind, self.root.display(), self.table)
    }
}

/// A connected store, usable as a scan source, a bulk-write destination, or both.
#[derive(Clone, Debug)]
pub enum Adapter {
    Jsonl(JsonlStore),
}

impl Adapter {
    pub fn open(location: &Location) -> Self {
        match location.kind {
            StoreKind::Jsonl => Adapter::Jsonl(JsonlStore::new(location.root.clone())),
        }
    }

    pub fn source(&self) -> Arc<dyn SourceStore> {
        match self {
            Adapter::Jsonl(store) => Arc::new(store.clone()),
        }
    }

    pub fn destination(&self) -> Arc<dyn DestinationStore> {
        match self {
            Adapter::Jsonl(store) => Arc::new(store.clone()),
        }
    }
}
