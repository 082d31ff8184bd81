//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Hard cap on the page size; larger requests are clamped, not rejected.
pub const MAX_PAGE_SIZE: i64 = 200;

/// Page size used when the client does not specify one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Catalog listing parameters (`?page=&size=&query=`).
///
/// `page` is 0-based. A non-empty `query` switches the endpoint from cached
/// pagination to an uncached search.
#[derive(Debug, Deserialize)]
pub struct CardListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub query: Option<String>,
}

impl CardListParams {
    /// Resolve page/size with defaults and the `[1, 200]` size clamp.
    pub fn page_and_size(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(0).max(0);
        let size = self
            .size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, size)
    }

    /// The trimmed search term, when one was supplied.
    pub fn search_term(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = CardListParams {
            page: None,
            size: None,
            query: None,
        };
        assert_eq!(params.page_and_size(), (0, 20));
        assert_eq!(params.search_term(), None);
    }

    #[test]
    fn test_size_clamped_to_max() {
        let params = CardListParams {
            page: Some(2),
            size: Some(1000),
            query: None,
        };
        assert_eq!(params.page_and_size(), (2, 200));
    }

    #[test]
    fn test_blank_query_is_no_search() {
        let params = CardListParams {
            page: None,
            size: None,
            query: Some("   ".into()),
        };
        assert_eq!(params.search_term(), None);
    }
}
