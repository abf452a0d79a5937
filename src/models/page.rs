//! Offset pagination for list operations.

use serde::{Deserialize, Serialize};

use crate::config::PaginationPolicy;

/// A resolved page request: 1-based page number and a bounded page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    pub limit: u32,
}

impl PageRequest {
    /// Builds a request from optional caller input.
    ///
    /// Missing or zero values fall back to page 1 and the default size; sizes
    /// above the maximum are clamped.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::config::PaginationPolicy;
    /// use payroll_engine::models::PageRequest;
    ///
    /// let policy = PaginationPolicy { default_limit: 10, max_limit: 100 };
    /// let page = PageRequest::resolve(Some(2), Some(500), &policy);
    ///
    /// assert_eq!(page.limit, 100);
    /// assert_eq!(page.offset(), 100);
    /// ```
    pub fn resolve(page: Option<u32>, limit: Option<u32>, policy: &PaginationPolicy) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(policy.default_limit)
            .min(policy.max_limit);
        Self { page, limit }
    }

    /// Number of items skipped before this page.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.limit as usize)
    }
}

/// Pagination metadata returned with a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: usize,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Where this page sits in the full result.
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Cuts the requested page out of an already ordered result.
    pub fn paginate(items: Vec<T>, request: PageRequest) -> Self {
        let total = items.len();
        let limit = request.limit.max(1) as usize;
        let data = items
            .into_iter()
            .skip(request.offset())
            .take(limit)
            .collect();

        Self {
            data,
            pagination: Pagination {
                page: request.page,
                limit: request.limit,
                total,
                total_pages: total.div_ceil(limit),
            },
        }
    }

    /// Transforms the items, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
