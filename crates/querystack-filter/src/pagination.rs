//! Parsing and resolution of pagination parameters.

use querystack_core::QueryStackConfig;
use querystack_model::{LAST_PAGE_TOKEN, PageInfo, Pagination};

use crate::error::{QueryError, QueryResult};

/// Parse the raw `limit`, `offset`, and `page_token` request values.
///
/// Empty values fall back to `0` / `""`. A page token equal to
/// [`LAST_PAGE_TOKEN`] marks a client that already reached the end and is
/// normalized to an empty token.
///
/// # Errors
///
/// Returns [`QueryError::InvalidPagination`] if `limit` or `offset` is not a
/// non-negative integer.
///
/// ```
/// use querystack_filter::parse_pagination;
///
/// let p = parse_pagination("20", "", "abc").unwrap();
/// assert_eq!((p.limit, p.offset, p.page_token.as_str()), (20, 0, "abc"));
/// assert!(parse_pagination("-1", "", "").is_err());
/// ```
pub fn parse_pagination(limit: &str, offset: &str, page_token: &str) -> QueryResult<Pagination> {
    let page_token = page_token.trim();
    Ok(Pagination {
        limit: parse_count("limit", limit)?,
        offset: parse_count("offset", offset)?,
        page_token: if page_token == LAST_PAGE_TOKEN {
            String::new()
        } else {
            page_token.to_owned()
        },
    })
}

fn parse_count(name: &str, raw: &str) -> QueryResult<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u32>().map_err(|_| {
        QueryError::InvalidPagination(format!(
            "{name} must be a non-negative integer, got '{raw}'"
        ))
    })
}

/// Page size to serve for `pagination` under `config`.
#[must_use]
pub fn effective_limit(pagination: &Pagination, config: &QueryStackConfig) -> u32 {
    config.effective_limit(pagination.limit)
}

/// Build the offset-based [`PageInfo`] for a page of `returned` records.
///
/// A short page marks the result set as exhausted.
#[must_use]
pub fn next_page_info(pagination: &Pagination, config: &QueryStackConfig, returned: usize) -> PageInfo {
    let size = u32::try_from(returned).unwrap_or(u32::MAX);
    let mut info = PageInfo {
        page_token: String::new(),
        offset: pagination.offset.saturating_add(size),
        size,
    };
    if size < effective_limit(pagination, config) {
        info.set_last_offset();
    }
    info
}
