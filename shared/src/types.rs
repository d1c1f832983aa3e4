//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// Clamp to sane bounds: page >= 1, 1 <= per_page <= 200
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 200),
        }
    }

    /// Row offset for the current page
    pub fn offset(&self) -> i64 {
        let p = self.clamped();
        i64::from(p.page - 1) * i64::from(p.per_page)
    }

    /// Row limit for the current page
    pub fn limit(&self) -> i64 {
        i64::from(self.clamped().per_page)
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    /// Build metadata from the requested page and a total row count
    pub fn new(pagination: Pagination, total_items: u64) -> Self {
        let p = pagination.clamped();
        let total_pages = if total_items == 0 {
            0
        } else {
            ((total_items + u64::from(p.per_page) - 1) / u64::from(p.per_page)) as u32
        };
        Self {
            page: p.page,
            per_page: p.per_page,
            total_items,
            total_pages,
        }
    }
}

/// Date range for queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::default();
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 20);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn test_pagination_offset() {
        let p = Pagination {
            page: 3,
            per_page: 50,
        };
        assert_eq!(p.offset(), 100);
        assert_eq!(p.limit(), 50);
    }

    #[test]
    fn test_pagination_clamps_zero_page() {
        let p = Pagination {
            page: 0,
            per_page: 0,
        };
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 1);
    }

    #[test]
    fn test_pagination_meta_rounds_up() {
        let meta = PaginationMeta::new(
            Pagination {
                page: 1,
                per_page: 20,
            },
            41,
        );
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.total_items, 41);
    }

    #[test]
    fn test_pagination_meta_empty() {
        let meta = PaginationMeta::new(Pagination::default(), 0);
        assert_eq!(meta.total_pages, 0);
    }
}
