#![allow(dead_code)]

use model::records::record::Record;
use std::{
    fs,
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

pub mod utils;

/// A profile-like record: `pk`/`sk` keys plus an epoch-seconds modification
/// time.
pub fn profile(i: usize, modified: i64) -> Record {
    Record::new()
        .with("pk", format!("user-{i}"))
        .with("sk", "profile")
        .with("name", format!("User {i}"))
        .with("lastModifiedDate", modified)
}

pub fn profiles(count: usize) -> Vec<Record> {
    (0..count).map(|i| profile(i, 1_700_000_000 + i as i64)).collect()
}

/// Writes `records` as the JSON-lines table `<root>/<table>.jsonl`.
pub fn write_table(root: &Path, table: &str, records: &[Record]) -> io::Result<PathBuf> {
    let path = root.join(format!("{table}.jsonl"));
    let mut file = fs::File::create(&path)?;
    for record in records {
        let line = record.to_json_line().map_err(io::Error::other)?;
        writeln!(file, "{line}")?;
    }
    Ok(path)
}

/// Reads the JSON-lines table `<root>/<table>.jsonl`; a missing file is an
/// empty table.
pub fn read_table(root: &Path, table: &str) -> io::Result<Vec<Record>> {
    let path = root.join(format!("{table}.jsonl"));
    let file = match fs::File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(Record::from_json_slice(line.as_bytes()).map_err(io::Error::other)?);
    }
    Ok(records)
}

/// File names directly under `dir`, sorted.
pub fn file_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Subdirectories of `dir`, sorted.
pub fn run_dirs(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
