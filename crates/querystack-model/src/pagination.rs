//! Pagination request and response types.
//!
//! [`Pagination`] carries what a client asked for (`_limit`, `_offset`,
//! `_page_token`); [`PageInfo`] carries what the server hands back, including
//! the sentinels that mark the last page.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Page token value meaning "no further pages".
pub const LAST_PAGE_TOKEN: &str = "null";

/// Offset value meaning "no further pages".
pub const LAST_OFFSET: u32 = 1 << 30;

/// Client pagination request. Zero/empty fields mean "not specified".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of records to return; `0` means unspecified.
    pub limit: u32,
    /// Number of records to skip.
    pub offset: u32,
    /// Opaque continuation token; empty means unspecified.
    pub page_token: String,
}

impl Pagination {
    /// Whether the request targets the first page.
    #[must_use]
    pub fn is_first_page(&self) -> bool {
        self.offset == 0 && self.page_token.is_empty()
    }

    /// The requested limit, or `default` when none was given.
    #[must_use]
    pub fn limit_or(&self, default: u32) -> u32 {
        if self.limit == 0 { default } else { self.limit }
    }
}

impl fmt::Display for Pagination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "limit={} offset={}", self.limit, self.offset)?;
        if !self.page_token.is_empty() {
            write!(f, " page_token={}", self.page_token)?;
        }
        Ok(())
    }
}

/// Pagination details returned alongside a page of results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Token for fetching the next page.
    pub page_token: String,
    /// Offset of the next page.
    pub offset: u32,
    /// Number of records in this page.
    pub size: u32,
}

impl PageInfo {
    /// Mark token-based pagination as exhausted.
    pub fn set_last_token(&mut self) {
        self.page_token = LAST_PAGE_TOKEN.to_owned();
    }

    /// Mark offset-based pagination as exhausted.
    pub fn set_last_offset(&mut self) {
        self.offset = LAST_OFFSET;
    }

    /// Whether either sentinel marks this as the last page.
    #[must_use]
    pub fn is_last_page(&self) -> bool {
        self.page_token == LAST_PAGE_TOKEN || self.offset == LAST_OFFSET
    }
}

impl fmt::Display for PageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset == LAST_OFFSET {
            write!(f, "size={} offset=last", self.size)?;
        } else {
            write!(f, "size={} offset={}", self.size, self.offset)?;
        }
        if !self.page_token.is_empty() {
            write!(f, " page_token={}", self.page_token)?;
        }
        Ok(())
    }
}
