//! Shared pagination utilities
//!
//! Common pagination types used by list queries. Defaults: page 1, 20 items
//! per page, clamped to 1-100.

use serde::{Deserialize, Serialize};

/// Pagination request parameters
#[derive(Debug, Clone, Default)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PaginationParams {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self { page, per_page }
    }

    /// Page number (1-indexed), defaulting to 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Items per page, defaulting to 20 and clamped to 1-100
    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }

    /// Offset for the storage layer
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }

    /// Validate pagination parameters
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(page) = self.page {
            if page < 1 {
                return Err("Page must be greater than 0");
            }
        }
        if let Some(per_page) = self.per_page {
            if !(1..=100).contains(&per_page) {
                return Err("Per page must be between 1 and 100");
            }
        }
        Ok(())
    }
}

/// Pagination metadata for responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMetadata {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Items per page
    pub per_page: i64,
    /// Total number of items
    pub total: i64,
    /// Total number of pages
    pub pages: i64,
    /// Whether there is a next page
    pub has_next: bool,
    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMetadata {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            page,
            per_page,
            total,
            pages,
            has_next: page < pages,
            has_prev: page > 1 && total > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let params = PaginationParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 20);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn offset_follows_page() {
        let params = PaginationParams::new(Some(3), Some(10));
        assert_eq!(params.offset(), 20);
    }

    #[test]
    fn validate_bounds() {
        assert!(PaginationParams::new(Some(0), None).validate().is_err());
        assert!(PaginationParams::new(None, Some(101)).validate().is_err());
        assert!(PaginationParams::new(Some(1), Some(100)).validate().is_ok());
    }

    #[test]
    fn metadata_page_math() {
        let meta = PaginationMetadata::new(2, 20, 45);
        assert_eq!(meta.pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);

        let empty = PaginationMetadata::new(1, 20, 0);
        assert_eq!(empty.pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }
}
