//! Parser for `order_by` expressions.
//!
//! The syntax is a comma-separated list of `field [asc|desc]` clauses. The
//! order keyword is case-insensitive and defaults to ascending.

use querystack_model::{SortCriteria, SortOrder, Sorting};
use tracing::debug;

use crate::error::{QueryError, QueryResult};

/// Parse an `order_by` expression such as `"last_name, age desc"`.
///
/// Empty or whitespace-only input yields an empty [`Sorting`].
///
/// # Errors
///
/// Returns [`QueryError::InvalidSorting`] for an empty clause, an unknown
/// order keyword, or a clause with more than two words.
pub fn parse_sorting(input: &str) -> QueryResult<Sorting> {
    if input.trim().is_empty() {
        return Ok(Sorting::default());
    }
    let criteria = input
        .split(',')
        .map(parse_criteria)
        .collect::<QueryResult<Vec<_>>>()?;
    let sorting = Sorting::new(criteria);
    debug!(expression = input, %sorting, "parsed sorting");
    Ok(sorting)
}

fn parse_criteria(clause: &str) -> QueryResult<SortCriteria> {
    let mut words = clause.split_whitespace();
    let Some(tag) = words.next() else {
        return Err(QueryError::InvalidSorting("empty sort clause".to_owned()));
    };
    let order = match words.next() {
        None => SortOrder::Asc,
        Some(word) if word.eq_ignore_ascii_case("asc") => SortOrder::Asc,
        Some(word) if word.eq_ignore_ascii_case("desc") => SortOrder::Desc,
        Some(word) => {
            return Err(QueryError::InvalidSorting(format!(
                "invalid sort order '{word}' for '{tag}', expected 'asc' or 'desc'"
            )));
        }
    };
    if let Some(extra) = words.next() {
        return Err(QueryError::InvalidSorting(format!(
            "unexpected '{extra}' after '{tag} {order}'"
        )));
    }
    Ok(SortCriteria::new(tag, order))
}
