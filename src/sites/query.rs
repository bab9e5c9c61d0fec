//! Listing-query normalization and pagination arithmetic.

use crate::labels::collapse_whitespace;

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 48;

/// Normalized filter terms handed to the repository. Blank input becomes
/// absent before it gets here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteFilter {
    pub q: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

/// Raw listing parameters as the caller sent them.
#[derive(Debug, Clone, Default)]
pub struct SiteQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl SiteQuery {
    pub fn filter(&self) -> SiteFilter {
        SiteFilter {
            q: self.q.as_deref().and_then(collapse_whitespace),
            category: self.category.as_deref().and_then(collapse_whitespace),
            tag: self.tag.as_deref().and_then(collapse_whitespace),
        }
    }

    /// Page size clamped into [1, MAX_PAGE_SIZE], defaulting when absent.
    pub fn resolved_page_size(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Requested page floored at 1. Clamping against the total page count
    /// happens once the matching total is known.
    pub fn requested_page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Total page count for a result set; an empty set still has one page.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    ((total + page_size - 1) / page_size).max(1)
}

/// Leniently parse a numeric query parameter the way the web tier receives
/// it: any finite number is accepted and rounded, anything else is absent.
pub fn parse_numeric_param(value: Option<&str>) -> Option<i64> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    let number = raw.parse::<f64>().ok()?;
    if number.is_finite() {
        Some(number.round() as i64)
    } else {
        None
    }
}
