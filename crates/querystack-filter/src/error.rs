//! Error type for parsing, evaluating, and validating queries.

use querystack_model::{FilterOperation, ValueType};

use crate::expression::TokenKind;

/// Errors produced by the query pipeline.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The lexer met a character it cannot start a token with.
    #[error("unexpected symbol '{symbol}' at position {position}")]
    UnexpectedSymbol {
        /// Offending text.
        symbol: String,
        /// Byte offset into the expression.
        position: usize,
    },
    /// The parser met a token the grammar does not allow here.
    #[error("unexpected {token} at position {position}, expected {}", join_kinds(.expected))]
    UnexpectedToken {
        /// Description of the token found.
        token: String,
        /// Token kinds that would have been accepted.
        expected: Vec<TokenKind>,
        /// Byte offset into the expression.
        position: usize,
    },
    /// The expression nests groups, `not` prefixes, or operators too deeply.
    #[error("expression nested deeper than {max_depth} levels at position {position}")]
    NestingTooDeep {
        /// Configured depth limit.
        max_depth: usize,
        /// Byte offset where the limit was crossed.
        position: usize,
    },
    /// A field could not be resolved or has the wrong type for the comparison.
    #[error("type mismatch for '{field_path}': {message}")]
    TypeMismatch {
        /// Dotted field path.
        field_path: String,
        /// Explanation.
        message: String,
    },
    /// A `~` pattern is not a valid regular expression.
    #[error(transparent)]
    Regex(#[from] regex::Error),
    /// Malformed `order_by` expression.
    #[error("invalid sorting: {0}")]
    InvalidSorting(String),
    /// Malformed `limit`, `offset`, or `page_token`.
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
    /// The policy table forbids this filter operation on the field.
    #[error("operation {operation} is not allowed for '{field}'")]
    OperationDenied {
        /// Dotted field path.
        field: String,
        /// Forbidden operation.
        operation: FilterOperation,
    },
    /// The policy table forbids sorting on the field.
    #[error("sorting is not allowed for '{field}'")]
    SortingDisabled {
        /// Dotted field path.
        field: String,
    },
    /// The filter literal does not have the type the policy requires.
    #[error("field '{field}' only accepts {expected} literals")]
    InvalidLiteralType {
        /// Dotted field path.
        field: String,
        /// Required literal type.
        expected: ValueType,
    },
}

/// Result alias for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

fn join_kinds(kinds: &[TokenKind]) -> String {
    match kinds {
        [] => "nothing".to_owned(),
        [only] => only.to_string(),
        [init @ .., last] => {
            let init: Vec<String> = init.iter().map(ToString::to_string).collect();
            format!("{} or {last}", init.join(", "))
        }
    }
}
