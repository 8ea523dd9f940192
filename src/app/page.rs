//! Page-number pagination shared by list use cases.

use crate::domain::limits::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::AppError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageReq {
    pub page: u32,
    pub limit: u32,
}

impl PageReq {
    /// Missing or zero values fall back to defaults; `limit` is capped.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit
                .filter(|l| *l > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    /// Pages past the last one do not exist; page 1 always does.
    pub fn ensure_in_range(&self, total: i64) -> Result<(), AppError> {
        if self.page > 1 && self.offset() >= total {
            return Err(AppError::NotFound(format!("page {}", self.page)));
        }
        Ok(())
    }
}

impl Default for PageReq {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        i64::from(self.page) * i64::from(self.limit) < self.total
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_caps() {
        assert_eq!(PageReq::new(None, None), PageReq { page: 1, limit: 6 });
        assert_eq!(PageReq::new(Some(0), Some(0)), PageReq { page: 1, limit: 6 });
        assert_eq!(PageReq::new(Some(3), Some(1000)).limit, 100);
        assert_eq!(PageReq::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn out_of_range_page() {
        let req = PageReq::new(Some(2), Some(5));
        assert!(req.ensure_in_range(5).is_err());
        assert!(req.ensure_in_range(6).is_ok());
        assert!(PageReq::default().ensure_in_range(0).is_ok());
    }

    #[test]
    fn next_and_previous() {
        let page = Page::<()> {
            items: vec![],
            total: 13,
            page: 2,
            limit: 6,
        };
        assert!(page.has_next());
        assert!(page.has_previous());
        let last = Page::<()> {
            items: vec![],
            total: 12,
            page: 2,
            limit: 6,
        };
        assert!(!last.has_next());
    }
}
