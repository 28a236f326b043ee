use crate::error::PipelineError;
use connectors::store::SourceStore;
use model::pagination::{
    cursor::PageCursor,
    filter::FilterPredicate,
    page::{PageRequest, PageResponse},
};
use std::{num::NonZeroUsize, sync::Arc};
use tracing::debug;

/// Issues bounded page requests against a source table.
#[derive(Clone)]
pub struct Scanner {
    store: Arc<dyn SourceStore>,
    location: String,
    page_size: NonZeroUsize,
    filter: Option<FilterPredicate>,
}

impl Scanner {
    pub fn new(store: Arc<dyn SourceStore>, location: impl Into<String>, page_size: NonZeroUsize) -> Self {
        Scanner {
            store,
            location: location.into(),
            page_size,
            filter: None,
        }
    }

    /// Restricts the scan to `filter`. The predicate's threshold is already
    /// resolved, so it stays fixed for the whole run.
    pub fn with_filter(mut self, filter: FilterPredicate) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    /// Cursor positioned before the first page.
    pub fn start(&self) -> PageCursor {
        PageCursor::new(self.filter.clone())
    }

    /// Request for the page `cursor` points at. Pure: the same cursor always
    /// yields the same request.
    pub fn build_request(&self, cursor: &PageCursor) -> PageRequest {
        PageRequest {
            location: self.location.clone(),
            limit: self.page_size,
            filter: cursor.predicate().cloned(),
            exclusive_start: cursor.token().cloned(),
        }
    }

    /// Fetches one page. Store errors are passed through unchanged, classified
    /// by whether the store was unreachable or refused the request.
    pub async fn fetch_page(&self, cursor: &PageCursor) -> Result<PageResponse, PipelineError> {
        let request = self.build_request(cursor);

        debug!(
            location = %self.location,
            page = cursor.page_index(),
            limit = self.page_size.get(),
            filter = ?request.filter.as_ref().map(|f| f.expression()),
            resume = ?request.exclusive_start,
            "Requesting page"
        );

        self.store
            .scan(&request)
            .await
            .map_err(|e| PipelineError::from_scan(&self.location, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::{
        error::StoreError,
        memory::{InjectedFailure, MemoryStore},
    };
    use model::{pagination::token::ContinuationToken, records::record::Record};

    fn scanner(store: MemoryStore) -> Scanner {
        Scanner::new(Arc::new(store), "profiles", NonZeroUsize::new(200).unwrap())
    }

    #[test]
    fn first_request_has_no_token() {
        let scanner = scanner(MemoryStore::new());
        let request = scanner.build_request(&scanner.start());

        assert_eq!(request.location, "profiles");
        assert_eq!(request.limit.get(), 200);
        assert!(request.filter.is_none());
        assert!(request.exclusive_start.is_none());
    }

    #[test]
    fn requests_forward_token_unchanged_and_keep_the_filter() {
        let filter = FilterPredicate::greater_than("lastModifiedDate", "2023-10-19T00:00:00.000Z");
        let scanner = scanner(MemoryStore::new()).with_filter(filter.clone());

        let mut cursor = scanner.start();
        let token = ContinuationToken::from_bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        cursor.advance(Some(token.clone()));

        let first = scanner.build_request(&cursor);
        let again = scanner.build_request(&cursor);
        assert_eq!(first, again);
        assert_eq!(first.exclusive_start.as_ref(), Some(&token));
        assert_eq!(first.filter.as_ref(), Some(&filter));
    }

    #[tokio::test]
    async fn classifies_store_failures() {
        let store = MemoryStore::new();
        store.put_table("profiles", vec![Record::new().with("id", 1)]).await;
        store.fail_scan_at(0, InjectedFailure::Unavailable).await;
        let unavailable = scanner(store).fetch_page(&PageCursor::new(None)).await;
        assert!(matches!(
            unavailable,
            Err(PipelineError::SourceUnavailable { .. })
        ));

        let missing = scanner(MemoryStore::new())
            .fetch_page(&PageCursor::new(None))
            .await;
        assert!(matches!(
            missing,
            Err(PipelineError::SourceRequestRejected {
                source: StoreError::TableNotFound(_),
                ..
            })
        ));
    }
}
