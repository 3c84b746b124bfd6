//! Pagination envelope with next/prev links.

use serde::{Deserialize, Serialize};

/// Pagination metadata attached to listing responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_data: i64,
    pub total_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

impl Pagination {
    /// Build pagination metadata for `total_data` rows.
    ///
    /// `base_url` is the public origin (no trailing slash), `path` the
    /// request path. Links are omitted at the edges.
    #[must_use]
    pub fn build(base_url: &str, path: &str, page: u32, limit: u32, total_data: i64) -> Self {
        let total = u64::try_from(total_data).unwrap_or(0);
        let total_page =
            u32::try_from(total.div_ceil(u64::from(limit.max(1)))).unwrap_or(u32::MAX);

        let link = |p: u32| format!("{base_url}{path}?page={p}&limit={limit}");
        let next = (page < total_page).then(|| link(page + 1));
        let prev = (page > 1).then(|| link(page - 1));

        Self {
            page,
            limit,
            total_data,
            total_page,
            next,
            prev,
        }
    }
}

/// Plain `?page=&limit=` query parameters for listings without filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

impl PageQuery {
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_middle_page_has_both_links() {
        let p = Pagination::build("http://api.test", "/products", 2, 10, 35);
        assert_eq!(p.total_page, 4);
        assert_eq!(p.next.as_deref(), Some("http://api.test/products?page=3&limit=10"));
        assert_eq!(p.prev.as_deref(), Some("http://api.test/products?page=1&limit=10"));
    }

    #[test]
    fn test_edges_omit_links() {
        let first = Pagination::build("http://api.test", "/products", 1, 10, 35);
        assert!(first.prev.is_none());
        assert!(first.next.is_some());

        let last = Pagination::build("http://api.test", "/products", 4, 10, 35);
        assert!(last.next.is_none());
        assert!(last.prev.is_some());
    }

    #[test]
    fn test_empty_result_has_zero_pages() {
        let p = Pagination::build("http://api.test", "/products", 1, 10, 0);
        assert_eq!(p.total_page, 0);
        assert!(p.next.is_none());
        assert!(p.prev.is_none());
    }

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(Pagination::build("http://t", "/p", 1, 10, 40).total_page, 4);
        assert_eq!(Pagination::build("http://t", "/p", 1, 10, 41).total_page, 5);
        assert_eq!(Pagination::build("http://t", "/p", 1, 10, 1).total_page, 1);
        // A negative total behaves like zero rows.
        assert_eq!(Pagination::build("http://t", "/p", 1, 10, -5).total_page, 0);
    }
}
