use crate::{
    connectors::sink::{Sink, WriteResult},
    error::SinkError,
};
use async_trait::async_trait;
use model::{pagination::page::Page, records::record::Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::HashSet,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Instant,
};
use tokio::{io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, info};

const MAX_STEM_LEN: usize = 120;

/// How per-record files are named.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileNaming {
    /// `record_00000000.json`, `record_00000001.json`, ... across the run.
    #[default]
    Sequence,
    /// Built from the values of these fields, e.g. `user-1_profile.json`.
    KeyFields(Vec<String>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileLayout {
    /// One file per record.
    #[default]
    PerRecord,
    /// One `page_<n>.json` array per page.
    PerPage,
}

#[derive(Debug, Default)]
struct FileSinkState {
    dir: Option<PathBuf>,
    next_seq: u64,
    /// Names handed out so far; only tracked for key-derived naming.
    used: HashSet<String>,
}

impl FileSinkState {
    fn next_name(&mut self, record: &Record, naming: &FileNaming) -> String {
        let seq = self.next_seq;
        self.next_seq += 1;

        match naming {
            FileNaming::Sequence => format!("record_{seq:08}.json"),
            FileNaming::KeyFields(fields) => {
                let stem = key_stem(record, fields).unwrap_or_else(|| format!("record_{seq:08}"));
                let mut name = format!("{stem}.json");
                if self.used.contains(&name) {
                    name = format!("{stem}~{seq}.json");
                }
                self.used.insert(name.clone());
                name
            }
        }
    }
}

/// Builds a file stem from key field values, or `None` when a field is
/// missing or not a scalar.
fn key_stem(record: &Record, fields: &[String]) -> Option<String> {
    if fields.is_empty() {
        return None;
    }

    let mut parts = Vec::with_capacity(fields.len());
    for field in fields {
        let part = match record.get(field)? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        parts.push(part);
    }

    let stem: String = parts
        .join("_")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_LEN)
        .collect();

    (!stem.is_empty()).then_some(stem)
}

async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await
}

/// Writes pages as JSON files under `<base_dir>/<run_label>/`.
///
/// The run directory is created on first write. If it already exists (another
/// run started in the same minute) the sink moves on to `<run_label>-2`,
/// `<run_label>-3`, and so on, so a run never writes into a directory it does
/// not own. Files are opened create-new and are never overwritten.
pub struct FileSink {
    name: String,
    base_dir: PathBuf,
    run_label: String,
    naming: FileNaming,
    layout: FileLayout,
    state: Mutex<FileSinkState>,
}

impl FileSink {
    pub fn new(base_dir: impl Into<PathBuf>, run_label: impl Into<String>) -> Self {
        FileSink {
            name: "files".to_string(),
            base_dir: base_dir.into(),
            run_label: run_label.into(),
            naming: FileNaming::default(),
            layout: FileLayout::default(),
            state: Mutex::new(FileSinkState::default()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_naming(mut self, naming: FileNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_layout(mut self, layout: FileLayout) -> Self {
        self.layout = layout;
        self
    }

    /// The run directory, once something has been written.
    pub async fn output_dir(&self) -> Option<PathBuf> {
        self.state.lock().await.dir.clone()
    }

    async fn ensure_dir(&self, state: &mut FileSinkState) -> Result<PathBuf, SinkError> {
        if let Some(dir) = &state.dir {
            return Ok(dir.clone());
        }

        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|source| SinkError::OutputDir {
                path: self.base_dir.clone(),
                source,
            })?;

        let mut attempt = 1u32;
        loop {
            let label = if attempt == 1 {
                self.run_label.clone()
            } else {
                format!("{}-{attempt}", self.run_label)
            };
            let path = self.base_dir.join(label);

            match tokio::fs::create_dir(&path).await {
                Ok(()) => {
                    info!(sink = %self.name, dir = %path.display(), "Created output directory");
                    state.dir = Some(path.clone());
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(source) => return Err(SinkError::OutputDir { path, source }),
            }
        }
    }

    async fn write_records(
        &self,
        page: &Page,
        dir: &Path,
        state: &mut FileSinkState,
    ) -> Result<usize, SinkError> {
        for (position, record) in page.records.iter().enumerate() {
            let bytes = record
                .to_pretty_json()
                .map_err(|source| SinkError::Serialize {
                    page: page.index,
                    position,
                    dir: dir.to_path_buf(),
                    record: Box::new(record.clone()),
                    source,
                })?;

            let path = dir.join(state.next_name(record, &self.naming));
            write_new(&path, &bytes)
                .await
                .map_err(|source| SinkError::Record {
                    page: page.index,
                    position,
                    path: path.clone(),
                    record: Box::new(record.clone()),
                    source,
                })?;
        }

        Ok(page.records.len())
    }

    async fn write_page_file(&self, page: &Page, dir: &Path) -> Result<usize, SinkError> {
        let bytes = serde_json::to_vec_pretty(&page.records).map_err(|e| SinkError::Serialize {
            page: page.index,
            position: 0,
            dir: dir.to_path_buf(),
            record: Box::new(page.records.first().cloned().unwrap_or_default()),
            source: e.into(),
        })?;

        let path = dir.join(format!("page_{}.json", page.index));
        write_new(&path, &bytes).await.map_err(|source| SinkError::Record {
            page: page.index,
            position: 0,
            path: path.clone(),
            record: Box::new(page.records.first().cloned().unwrap_or_default()),
            source,
        })?;

        Ok(page.records.len())
    }
}

#[async_trait]
impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn consume_page(&self, page: &Page) -> Result<WriteResult, SinkError> {
        let start = Instant::now();

        // Per-record output for an empty page touches nothing, not even the
        // directory; per-page output still records that the page existed.
        if page.is_empty() && self.layout == FileLayout::PerRecord {
            return Ok(WriteResult {
                duration: start.elapsed(),
                output_dir: self.output_dir().await,
                ..WriteResult::default()
            });
        }

        let mut state = self.state.lock().await;
        let dir = self.ensure_dir(&mut state).await?;

        let records_written = match self.layout {
            FileLayout::PerRecord => self.write_records(page, &dir, &mut state).await?,
            FileLayout::PerPage => self.write_page_file(page, &dir).await?,
        };

        debug!(
            sink = %self.name,
            page = page.index,
            records = records_written,
            dir = %dir.display(),
            "Wrote page to files"
        );

        Ok(WriteResult {
            records_written,
            batches_written: 0,
            duration: start.elapsed(),
            output_dir: Some(dir),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn page(index: u64, ids: std::ops::Range<usize>) -> Page {
        Page::new(
            index,
            ids.map(|i| Record::new().with("pk", format!("user-{i}")).with("n", i))
                .collect(),
        )
    }

    async fn file_names(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        names
    }

    #[tokio::test]
    async fn sequence_names_are_unique_across_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path(), "20250417_1832");

        let mut total = 0;
        for (index, start) in (0..10u64).zip((0..1000).step_by(100)) {
            let result = sink.consume_page(&page(index, start..start + 100)).await.unwrap();
            total += result.records_written;
        }

        let dir = sink.output_dir().await.unwrap();
        assert_eq!(dir, tmp.path().join("20250417_1832"));
        let names = file_names(&dir).await;
        assert_eq!(total, 1000);
        assert_eq!(names.len(), 1000);
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), 1000);
        assert_eq!(names[0], "record_00000000.json");
    }

    #[tokio::test]
    async fn files_hold_pretty_json_in_field_order() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path(), "run");
        sink.consume_page(&page(0, 0..1)).await.unwrap();

        let dir = sink.output_dir().await.unwrap();
        let text = tokio::fs::read_to_string(dir.join("record_00000000.json"))
            .await
            .unwrap();
        assert_eq!(text, "{\n  \"pk\": \"user-0\",\n  \"n\": 0\n}");
    }

    #[tokio::test]
    async fn key_field_names_never_collide() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path(), "run")
            .with_naming(FileNaming::KeyFields(vec!["pk".to_string()]));

        let records = vec![
            Record::new().with("pk", "a/b"),
            Record::new().with("pk", "a/b"),
            Record::new().with("other", 1),
        ];
        let result = sink.consume_page(&Page::new(0, records)).await.unwrap();
        assert_eq!(result.records_written, 3);

        let names = file_names(&sink.output_dir().await.unwrap()).await;
        assert_eq!(names, vec!["a_b.json", "a_b~1.json", "record_00000002.json"]);
    }

    #[tokio::test]
    async fn runs_never_share_a_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let first = FileSink::new(tmp.path(), "20250417_1832");
        let second = FileSink::new(tmp.path(), "20250417_1832");

        first.consume_page(&page(0, 0..2)).await.unwrap();
        second.consume_page(&page(0, 0..2)).await.unwrap();

        assert_eq!(
            second.output_dir().await.unwrap(),
            tmp.path().join("20250417_1832-2")
        );
        assert_eq!(file_names(&first.output_dir().await.unwrap()).await.len(), 2);
    }

    #[tokio::test]
    async fn empty_pages_create_nothing_in_record_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path().join("out"), "run");

        let result = sink.consume_page(&Page::new(0, Vec::new())).await.unwrap();
        assert_eq!(result.records_written, 0);
        assert!(sink.output_dir().await.is_none());
        assert!(!tmp.path().join("out").exists());
    }

    #[tokio::test]
    async fn page_layout_writes_one_array_per_page() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path(), "run").with_layout(FileLayout::PerPage);

        sink.consume_page(&page(0, 0..3)).await.unwrap();
        sink.consume_page(&Page::new(1, Vec::new())).await.unwrap();

        let dir = sink.output_dir().await.unwrap();
        assert_eq!(file_names(&dir).await, vec!["page_0.json", "page_1.json"]);
        let first: Vec<Record> =
            serde_json::from_slice(&tokio::fs::read(dir.join("page_0.json")).await.unwrap())
                .unwrap();
        assert_eq!(first.len(), 3);
    }

    #[tokio::test]
    async fn unwritable_directory_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        tokio::fs::write(&blocker, b"x").await.unwrap();

        let sink = FileSink::new(&blocker, "run");
        let err = sink.consume_page(&page(0, 0..1)).await.unwrap_err();
        assert!(matches!(err, SinkError::OutputDir { .. }));
        assert_eq!(err.records_written(), 0);
        assert!(err.output_dir().is_none());
    }

    #[tokio::test]
    async fn mid_page_write_failure_keeps_earlier_files() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path(), "run");
        sink.consume_page(&page(0, 0..2)).await.unwrap();

        // The second record of the next page lands on a name that is taken.
        let dir = sink.output_dir().await.unwrap();
        tokio::fs::write(dir.join("record_00000003.json"), b"taken")
            .await
            .unwrap();

        let err = sink.consume_page(&page(1, 2..5)).await.unwrap_err();
        match &err {
            SinkError::Record {
                page,
                position,
                path,
                record,
                source,
            } => {
                assert_eq!(*page, 1);
                assert_eq!(*position, 1);
                assert_eq!(path, &dir.join("record_00000003.json"));
                assert_eq!(record.get("pk"), Some(&Value::from("user-3")));
                assert_eq!(source.kind(), ErrorKind::AlreadyExists);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.records_written(), 1);
        assert_eq!(err.output_dir(), Some(dir.as_path()));

        assert_eq!(
            tokio::fs::read_to_string(dir.join("record_00000003.json"))
                .await
                .unwrap(),
            "taken"
        );
        assert_eq!(
            file_names(&dir).await,
            vec![
                "record_00000000.json",
                "record_00000001.json",
                "record_00000002.json",
                "record_00000003.json",
            ]
        );
    }
}
