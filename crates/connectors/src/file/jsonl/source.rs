use crate::{
    error::StoreError,
    file::jsonl::{JsonlStore, decode_offset, encode_offset},
    store::SourceStore,
};
use async_trait::async_trait;
use model::{
    pagination::page::{PageRequest, PageResponse},
    records::record::Record,
};
use std::io::ErrorKind;
use tracing::debug;

#[async_trait]
impl SourceStore for JsonlStore {
    async fn scan(&self, request: &PageRequest) -> Result<PageResponse, StoreError> {
        let start = std::time::Instant::now();
        let path = self.table_path(&request.location)?;
        let offset = match &request.exclusive_start {
            Some(token) => decode_offset(token)?,
            None => 0,
        };

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::TableNotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let limit = request.limit.get();
        let mut records = Vec::new();
        let mut examined = 0usize;
        let mut next = None;

        for (index, line) in content.lines().enumerate().skip(offset) {
            if line.trim().is_empty() {
                continue;
            }

            let record = Record::from_json_slice(line.as_bytes()).map_err(|e| {
                StoreError::MalformedItem {
                    line: index + 1,
                    message: e.to_string(),
                }
            })?;
            examined += 1;

            if request.filter.as_ref().is_none_or(|f| f.matches(&record)) {
                records.push(record);
            }

            // Like a scan with a limit: hitting the limit always yields a
            // token, even if nothing follows. The next call then comes back
            // empty and without one.
            if examined == limit {
                next = Some(encode_offset(index + 1));
                break;
            }
        }

        debug!(
            table = %request.location,
            offset,
            examined,
            matched = records.len(),
            has_next = next.is_some(),
            took_ms = start.elapsed().as_millis(),
            "Scanned JSON-lines table"
        );

        Ok(PageResponse::new(records, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::pagination::filter::FilterPredicate;
    use std::num::NonZeroUsize;

    async fn table_with(lines: &[&str]) -> (tempfile::TempDir, JsonlStore) {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("items.jsonl"), lines.join("\n"))
            .await
            .unwrap();
        let store = JsonlStore::new(dir.path());
        (dir, store)
    }

    fn request(limit: usize) -> PageRequest {
        PageRequest {
            location: "items".to_string(),
            limit: NonZeroUsize::new(limit).unwrap(),
            filter: None,
            exclusive_start: None,
        }
    }

    #[tokio::test]
    async fn pages_until_token_is_absent() {
        let (_dir, store) =
            table_with(&[r#"{"id":1}"#, r#"{"id":2}"#, "", r#"{"id":3}"#, r#"{"id":4}"#]).await;

        let mut req = request(2);
        let first = store.scan(&req).await.unwrap();
        assert_eq!(first.records.len(), 2);
        assert!(first.next.is_some());

        req.exclusive_start = first.next.clone();
        let second = store.scan(&req).await.unwrap();
        assert_eq!(second.records.len(), 2);
        assert_eq!(second.records[0].get("id"), Some(&serde_json::json!(3)));
        assert!(second.next.is_some());

        req.exclusive_start = second.next.clone();
        let third = store.scan(&req).await.unwrap();
        assert!(third.records.is_empty());
        assert!(third.is_last());
    }

    #[tokio::test]
    async fn filtered_page_can_be_empty_with_a_token() {
        let (_dir, store) = table_with(&[
            r#"{"id":1,"ts":"2020-01-01"}"#,
            r#"{"id":2,"ts":"2020-02-01"}"#,
            r#"{"id":3,"ts":"2025-01-01"}"#,
        ])
        .await;

        let mut req = request(2);
        req.filter = Some(FilterPredicate::greater_than("ts", "2024-01-01"));

        let first = store.scan(&req).await.unwrap();
        assert!(first.records.is_empty());
        assert!(first.next.is_some());

        req.exclusive_start = first.next;
        let second = store.scan(&req).await.unwrap();
        assert_eq!(second.records.len(), 1);
        assert!(second.is_last());
    }

    #[tokio::test]
    async fn missing_table_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(dir.path());
        let err = store.scan(&request(10)).await.unwrap_err();
        assert!(matches!(err, StoreError::TableNotFound(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn malformed_line_is_reported_with_its_number() {
        let (_dir, store) = table_with(&[r#"{"id":1}"#, "not json"]).await;
        let err = store.scan(&request(10)).await.unwrap_err();
        assert!(matches!(err, StoreError::MalformedItem { line: 2, .. }));
    }
}
