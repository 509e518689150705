use serde::{Deserialize, Serialize};

use crate::constants::pagination::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE};

/// Requested page of a sequence-ordered listing (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Page {
    /// Clamp user-supplied values into the accepted range
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

/// Pagination metadata returned next to a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub page: u32,
    pub per_page: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaginationInfo {
    pub fn new(page: Page, total_count: u64) -> Self {
        let per_page = u64::from(page.per_page);
        let total_pages = total_count.div_ceil(per_page);
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);

        Self {
            page: page.page,
            per_page: page.per_page,
            total_count,
            total_pages,
            has_next: page.page < total_pages,
            has_previous: page.page > 1,
        }
    }
}
