//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// `OFFSET` is a signed 64-bit value in Postgres.
const MAX_OFFSET: u64 = i64::MAX as u64;

/// A requested page (1-based) and its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// Page numbers below 1 are treated as page 1.
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Rows to skip. Saturates at the largest OFFSET Postgres accepts, so an
    /// absurd page number still reads past the end and resolves to a redirect.
    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.per_page)
            .min(MAX_OFFSET)
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = if per_page > 0 {
            total.div_ceil(per_page)
        } else {
            0
        };

        Self {
            data,
            meta: PaginationMeta {
                page,
                per_page,
                total,
                total_pages,
            },
        }
    }
}

/// Result of fetching a page: the rows, or the page to redirect to.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome<T> {
    Page(Paginated<T>),
    /// The request skipped past the data; carries the last valid page (at least 1)
    Redirect(u64),
}

impl<T> PageOutcome<T> {
    /// Build the outcome for `request` given the fetched rows and the total row count.
    pub fn resolve(request: PageRequest, data: Vec<T>, total: u64) -> Self {
        let page = Paginated::new(data, request.page, request.per_page, total);
        if page.data.is_empty() && request.offset() > 0 {
            PageOutcome::Redirect(page.meta.total_pages.max(1))
        } else {
            PageOutcome::Page(page)
        }
    }
}
