//! Pagination types
//!
//! Every list endpoint accepts `page` and `limit` query parameters and
//! answers with a [`PageMeta`] block next to the data.

use serde::{Deserialize, Serialize};

/// Default page size
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest accepted page size
pub const MAX_LIMIT: u32 = 100;

/// Raw `?page=&limit=` query parameters
///
/// Kept as strings so that garbage input falls back to defaults instead of
/// rejecting the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page.to_string()),
            limit: Some(limit.to_string()),
        }
    }

    /// Normalize into a [`Page`]
    ///
    /// - `page < 1` or unparseable → 1
    /// - `limit` outside `1..=100` or unparseable → 10
    pub fn resolve(&self) -> Page {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(u32::MAX as i64) as u32)
            .unwrap_or(1);
        let limit = self
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| (1..=MAX_LIMIT as i64).contains(l))
            .map(|l| l as u32)
            .unwrap_or(DEFAULT_LIMIT);
        Page { page, limit }
    }
}

/// Normalized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number
    pub page: u32,
    /// Items per page (1..=100)
    pub limit: u32,
}

impl Page {
    /// Row offset for the storage query
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    pub fn meta(&self, total: i64) -> PageMeta {
        PageMeta::new(self.page, self.limit, total)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page number (1-based)
    pub page: u32,
    /// Items per page
    pub limit: u32,
    /// Total number of items
    pub total: i64,
    /// Total number of pages
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageMeta {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let total = total.max(0);
        let total_pages = if limit == 0 {
            0
        } else {
            ((total + limit as i64 - 1) / limit as i64) as u32
        };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_first_page_of_three() {
        let meta = PageMeta::new(1, 10, 25);
        assert_eq!(meta.total, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(!meta.has_previous);
    }

    #[test]
    fn test_meta_last_page() {
        let meta = PageMeta::new(3, 10, 25);
        assert!(!meta.has_next);
        assert!(meta.has_previous);
    }

    #[test]
    fn test_meta_empty() {
        let meta = PageMeta::new(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_previous);
    }

    #[test]
    fn test_resolve_defaults() {
        assert_eq!(PageQuery::default().resolve(), Page { page: 1, limit: 10 });
    }

    #[test]
    fn test_resolve_out_of_range() {
        let query = PageQuery {
            page: Some("0".into()),
            limit: Some("500".into()),
        };
        assert_eq!(query.resolve(), Page { page: 1, limit: 10 });

        let query = PageQuery {
            page: Some("-3".into()),
            limit: Some("0".into()),
        };
        assert_eq!(query.resolve(), Page { page: 1, limit: 10 });
    }

    #[test]
    fn test_resolve_garbage() {
        let query = PageQuery {
            page: Some("abc".into()),
            limit: Some("ten".into()),
        };
        assert_eq!(query.resolve(), Page::default());
    }

    #[test]
    fn test_offset() {
        let page = PageQuery::new(3, 20).resolve();
        assert_eq!(page, Page { page: 3, limit: 20 });
        assert_eq!(page.offset(), 40);
    }
}
