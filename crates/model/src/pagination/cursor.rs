use crate::pagination::{filter::FilterPredicate, token::ContinuationToken};

/// Scan position for one run.
///
/// Holds the token returned by the last page together with the filter
/// predicate fixed at run start, so every page of a run is requested with the
/// same threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageCursor {
    token: Option<ContinuationToken>,
    predicate: Option<FilterPredicate>,
    pages: u64,
    exhausted: bool,
}

impl PageCursor {
    pub fn new(predicate: Option<FilterPredicate>) -> Self {
        PageCursor {
            token: None,
            predicate,
            pages: 0,
            exhausted: false,
        }
    }

    /// Token to resume from; `None` before the first page.
    pub fn token(&self) -> Option<&ContinuationToken> {
        self.token.as_ref()
    }

    pub fn predicate(&self) -> Option<&FilterPredicate> {
        self.predicate.as_ref()
    }

    /// Zero-based index of the page the cursor points at.
    pub fn page_index(&self) -> u64 {
        self.pages
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Moves past the current page. An absent `next` token is the only thing
    /// that ends a scan; empty pages do not.
    pub fn advance(&mut self, next: Option<ContinuationToken>) {
        self.pages += 1;
        self.exhausted = next.is_none();
        self.token = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_until_token_is_absent() {
        let mut cursor = PageCursor::new(None);
        assert_eq!(cursor.page_index(), 0);
        assert!(cursor.token().is_none());
        assert!(!cursor.is_exhausted());

        let t1 = ContinuationToken::from_bytes(vec![1, 2, 3]);
        cursor.advance(Some(t1.clone()));
        assert_eq!(cursor.token(), Some(&t1));
        assert_eq!(cursor.page_index(), 1);
        assert!(!cursor.is_exhausted());

        cursor.advance(None);
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.page_index(), 2);
    }
}
