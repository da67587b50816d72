/// API route handlers
///
/// - `health`: liveness and database connectivity
/// - `projects`: project lifecycle, membership directory, labels
/// - `issues`: the issue board — create, move, reorder, subtasks
pub mod health;
pub mod issues;
pub mod projects;

use serde::{Deserialize, Serialize};

/// Common pagination query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct PageParams {
    /// Zero-based page index
    pub page: Option<i64>,

    /// Page size (default 20, capped at 100)
    pub per_page: Option<i64>,
}

impl PageParams {
    /// Resolves (limit, offset) from the raw parameters
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let page = self.page.unwrap_or(0).max(0);
        (per_page, page * per_page)
    }

    /// The resolved zero-based page index
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(0).max(0)
    }

    /// The resolved page size
    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}

/// A page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,

    /// Zero-based page index
    pub page: i64,

    /// Page size
    pub per_page: i64,

    /// Total matching items across all pages
    pub total: i64,
}
