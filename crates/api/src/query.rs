//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Default page size when `per_page` is absent or out of range.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Largest accepted page size.
pub const MAX_PER_PAGE: u32 = 100;

/// Page-based pagination parameters (`?page=&per_page=`).
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    /// Resolve to `(page, per_page)`. A page below 1 becomes 1; a page size
    /// outside `1..=MAX_PER_PAGE` falls back to the default.
    pub fn resolve(&self) -> (u32, u32) {
        let page = self
            .page
            .filter(|p| *p >= 1)
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(1);
        let per_page = self
            .per_page
            .filter(|p| (1..=i64::from(MAX_PER_PAGE)).contains(p))
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(DEFAULT_PER_PAGE);
        (page, per_page)
    }
}

/// Query parameters for `GET /admin/phone/quarantined`.
#[derive(Debug, Default, Deserialize)]
pub struct QuarantinedParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// `true` lists only expired quarantines, `false` only running ones.
    pub expired: Option<bool>,
}

impl QuarantinedParams {
    pub fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(page: Option<i64>, per_page: Option<i64>) -> (u32, u32) {
        PageParams { page, per_page }.resolve()
    }

    #[test]
    fn defaults_when_absent() {
        assert_eq!(resolve(None, None), (1, DEFAULT_PER_PAGE));
    }

    #[test]
    fn out_of_range_values_fall_back() {
        assert_eq!(resolve(Some(0), Some(0)), (1, DEFAULT_PER_PAGE));
        assert_eq!(resolve(Some(-3), Some(101)), (1, DEFAULT_PER_PAGE));
        assert_eq!(resolve(Some(4), Some(100)), (4, 100));
    }
}
