//! A table store backed by JSON-lines files: table `t` lives in `<root>/t.jsonl`,
//! one JSON object per line.

use crate::error::StoreError;
use model::pagination::token::ContinuationToken;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;

pub mod destination;
pub mod source;

#[derive(Debug, Clone)]
pub struct JsonlStore {
    root: PathBuf,
    /// Serializes appends so concurrent batch writes never interleave lines.
    write_lock: Arc<Mutex<()>>,
}

impl JsonlStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonlStore {
            root: root.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table_path(&self, table: &str) -> Result<PathBuf, StoreError> {
        if table.is_empty()
            || table.contains(['/', '\\'])
            || table == "."
            || table == ".."
        {
            return Err(StoreError::Rejected(format!("Invalid table name: '{table}'")));
        }
        Ok(self.root.join(format!("{table}.jsonl")))
    }
}

/// Tokens are the line index to resume from, big-endian.
pub(crate) fn encode_offset(line: usize) -> ContinuationToken {
    ContinuationToken::from_bytes((line as u64).to_be_bytes().to_vec())
}

pub(crate) fn decode_offset(token: &ContinuationToken) -> Result<usize, StoreError> {
    let bytes: [u8; 8] = token.as_bytes().try_into().map_err(|_| {
        StoreError::InvalidToken(format!("expected 8 bytes, got {}", token.len()))
    })?;
    Ok(u64::from_be_bytes(bytes) as usize)
}
