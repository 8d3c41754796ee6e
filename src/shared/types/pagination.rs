//! Offset pagination data model
//!
//! `PageRequest` is always valid once constructed: out-of-range input is
//! clamped, never rejected.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Upper bound for any page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// A clamped `(page, page_size)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    /// `page < 1` becomes 1, `page_size` is clamped into `[1, MAX_PAGE_SIZE]`.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Rows to skip before this page starts, saturating at `u64::MAX`.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn window(&self) -> Window {
        Window {
            skip: self.skip(),
            take: self.page_size,
        }
    }

    /// Re-clamp the page size against a tighter cap.
    pub fn capped(self, max_page_size: u64) -> Self {
        Self {
            page: self.page,
            page_size: self.page_size.clamp(1, max_page_size.max(1)),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Offset/limit window handed to data-fetch functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub take: u64,
}

/// Page metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Total number of records matching the query
    #[schema(example = 42)]
    pub total: u64,
    /// Current page number (1-based)
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page
    #[schema(example = 10)]
    pub page_size: u64,
    /// `ceil(total / pageSize)`
    #[schema(example = 5)]
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PageMeta {
    pub fn new(total: u64, page: u64, page_size: u64) -> Self {
        let total_pages = total.div_ceil(page_size.max(1));
        Self {
            total,
            page,
            page_size,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        }
    }
}

/// RFC 5988 style navigation links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageLinks {
    #[serde(rename = "self")]
    #[schema(example = "/api/v1/surf/recent-times?page=2&pageSize=20")]
    pub self_link: String,
    #[schema(example = "/api/v1/surf/recent-times?page=1&pageSize=20")]
    pub first: String,
    #[schema(example = "/api/v1/surf/recent-times?page=1&pageSize=20", nullable)]
    pub prev: Option<String>,
    #[schema(example = "/api/v1/surf/recent-times?page=3&pageSize=20", nullable)]
    pub next: Option<String>,
    #[schema(example = "/api/v1/surf/recent-times?page=5&pageSize=20")]
    pub last: String,
}

/// One page of results with metadata and links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
    pub links: PageLinks,
}

impl<T> PageResult<T> {
    /// Transform the rows while keeping `meta` and `links` untouched.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
            links: self.links,
        }
    }
}

/// Pagination query parameters for list endpoints
///
/// Paging values are never rejected: anything that does not parse as an
/// integer reads as missing, and out-of-range numbers are clamped later by
/// [`PageRequest::new`].
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number (starting at 1). Default: 1
    #[serde(default, deserialize_with = "lenient_integer")]
    pub page: Option<i64>,
    /// Items per page, clamped to 1..=100. Default: 10
    #[serde(default, deserialize_with = "lenient_integer")]
    pub page_size: Option<i64>,
}

impl PageQuery {
    /// Page number with negatives read as 0 (and so clamped to 1).
    pub fn page_number(&self) -> Option<u64> {
        self.page.map(|p| p.max(0) as u64)
    }

    pub fn page_size_value(&self) -> Option<u64> {
        self.page_size.map(|s| s.max(0) as u64)
    }
}

impl From<&PageQuery> for PageRequest {
    fn from(q: &PageQuery) -> Self {
        PageRequest::new(
            q.page_number().unwrap_or(1),
            q.page_size_value().unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

/// Query-string integer that reads as `None` when it does not parse.
pub fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse::<i64>().ok()))
}
