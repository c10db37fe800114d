//! Offset-based pagination.
//!
//! ```rust
//! use quarry_query::Pagination;
//!
//! let pagination = Pagination::new().offset(10).limit(20);
//! assert_eq!(pagination.to_sql(), "LIMIT 20 OFFSET 10");
//!
//! // Page-based pagination (1-indexed)
//! let page_3 = Pagination::page(3, 25);
//! assert_eq!(page_3.offset, Some(50));
//! assert_eq!(page_3.limit, Some(25));
//! ```

use std::fmt::Write;

/// Limit and offset of a query. Setting either replaces the previous value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Maximum number of rows.
    pub limit: Option<u64>,
    /// Number of rows to skip.
    pub offset: Option<u64>,
}

impl Pagination {
    /// Create a new pagination with no limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of rows.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the number of rows to skip.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Page `page` (1-indexed) of `page_size` rows.
    pub fn page(page: u64, page_size: u64) -> Self {
        Self {
            limit: Some(page_size),
            offset: Some(page.saturating_sub(1) * page_size),
        }
    }

    /// Check if pagination is specified.
    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.offset.is_none()
    }

    /// Generate the LIMIT/OFFSET clause.
    pub fn to_sql(&self) -> String {
        let mut sql = String::with_capacity(32);
        self.write_sql(&mut sql);
        sql
    }

    /// Write the LIMIT/OFFSET clause directly to a buffer.
    #[inline]
    pub fn write_sql(&self, buffer: &mut String) {
        if let Some(limit) = self.limit {
            let _ = write!(buffer, "LIMIT {}", limit);
        }

        if let Some(offset) = self.offset {
            if self.limit.is_some() {
                buffer.push(' ');
            }
            let _ = write!(buffer, "OFFSET {}", offset);
        }
    }
}
