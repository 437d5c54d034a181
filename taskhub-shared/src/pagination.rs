/// Paginated result envelope
///
/// Every listing endpoint returns a `Page<T>`: the requested slice of rows
/// plus metadata describing where the slice sits in the full result set.
///
/// # Example
///
/// ```
/// use taskhub_shared::pagination::Page;
///
/// let page = Page::new(vec!["a", "b"], 25, 2, 10);
/// assert_eq!(page.pagination.total_pages, 3);
/// assert!(page.pagination.has_next);
/// assert!(page.pagination.has_prev);
/// ```
use serde::{Deserialize, Serialize};

/// Default page number when none is supplied
pub const DEFAULT_PAGE: i64 = 1;

/// Default page size when none is supplied
pub const DEFAULT_LIMIT: i64 = 10;

/// Upper bound on page size to keep result sets reasonable
pub const MAX_LIMIT: i64 = 100;

/// Pagination metadata attached to every listing response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Total number of rows matching the query
    pub total: i64,

    /// Current page number (1-based)
    pub page: i64,

    /// Page size
    pub limit: i64,

    /// Total number of pages
    pub total_pages: i64,

    /// Whether a later page exists
    pub has_next: bool,

    /// Whether an earlier page exists
    pub has_prev: bool,
}

/// A page of results plus pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// The rows on this page
    pub data: Vec<T>,

    /// Metadata describing the slice
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    /// Builds a page envelope from a slice of rows and the total row count
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };

        Self {
            data,
            pagination: PaginationMeta {
                total,
                page,
                limit,
                total_pages,
                has_next: page < total_pages,
                has_prev: page > 1,
            },
        }
    }
}

/// Page/limit query parameters shared by listing endpoints
///
/// Missing or out-of-range values fall back to sane defaults rather than
/// erroring, matching what clients expect from listing APIs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    /// Requested page number (1-based)
    pub page: Option<i64>,

    /// Requested page size
    pub limit: Option<i64>,
}

impl PageParams {
    /// Effective page number, clamped to >= 1
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE)
    }

    /// Effective page size, clamped to 1..=MAX_LIMIT
    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT)
    }

    /// Row offset for the effective page
    ///
    /// Saturates instead of overflowing, so an absurd requested page
    /// yields an empty slice rather than a panic or a negative OFFSET.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_metadata() {
        let page = Page::new(vec![1, 2, 3], 25, 1, 10);
        assert_eq!(page.pagination.total, 25);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(page.pagination.has_next);
        assert!(!page.pagination.has_prev);
    }

    #[test]
    fn test_last_page_has_no_next() {
        let page: Page<i32> = Page::new(vec![], 25, 3, 10);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_prev);
    }

    #[test]
    fn test_empty_result_set() {
        let page: Page<i32> = Page::new(vec![], 0, 1, 10);
        assert_eq!(page.pagination.total_pages, 0);
        assert!(!page.pagination.has_next);
        assert!(!page.pagination.has_prev);
    }

    #[test]
    fn test_page_params_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_page_params_clamping() {
        let params = PageParams {
            page: Some(0),
            limit: Some(10_000),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), MAX_LIMIT);

        let params = PageParams {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn test_offset_saturates_on_huge_page() {
        let params = PageParams {
            page: Some(i64::MAX),
            limit: Some(100),
        };
        assert_eq!(params.offset(), i64::MAX);
        assert!(params.offset() >= 0);
    }
}
