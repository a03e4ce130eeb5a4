//! API handlers
//!
//! Author: hephaex@gmail.com

pub mod collections;
pub mod databases;
pub mod documents;
pub mod health;
pub mod query;
pub mod session;

use crate::error::AppError;

/// Default number of documents per page
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;
/// Default number of search hits
pub const DEFAULT_N_RESULTS: usize = 5;
/// Largest number of search hits a caller may request
pub const MAX_N_RESULTS: usize = 100;

/// Trimmed value of a required text field
pub(crate) fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::bad_request(format!("{field} must not be empty")));
    }
    Ok(value)
}

/// Validated 1-indexed page position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn from_query(page: Option<u32>, page_size: Option<u32>) -> Result<Self, AppError> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err(AppError::bad_request("page starts at 1"));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(AppError::bad_request(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        Ok(Self { page, page_size })
    }

    /// Number of documents before this page
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }

    pub fn limit(&self) -> usize {
        self.page_size as usize
    }
}

/// Pages needed to show `total` documents
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    total.div_ceil(u64::from(page_size.max(1)))
}

/// Requested hit count, defaulted and bounded
pub(crate) fn n_results(requested: Option<usize>) -> Result<usize, AppError> {
    let n = requested.unwrap_or(DEFAULT_N_RESULTS);
    if !(1..=MAX_N_RESULTS).contains(&n) {
        return Err(AppError::bad_request(format!(
            "n_results must be between 1 and {MAX_N_RESULTS}"
        )));
    }
    Ok(n)
}
