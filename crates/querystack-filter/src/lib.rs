//! Query language for QueryStack.
//!
//! Turns the raw strings a client sends (`filter`, `order_by`, `limit`,
//! `offset`, `page_token`) into typed values, evaluates filters against
//! in-memory records, and checks both filters and sort keys against a
//! per-field [`PolicyTable`](querystack_model::PolicyTable).
//!
//! ```
//! use querystack_core::FieldRegistry;
//! use querystack_filter::Evaluator;
//!
//! let registry = FieldRegistry::new();
//! let user = serde_json::json!({ "name": "Jan", "age": 42 });
//!
//! let evaluator = Evaluator::new(&registry);
//! assert!(evaluator.filter(&user, "name ~ '^J' and age >= 18").unwrap());
//! ```

pub mod error;
pub mod expression;
pub mod pagination;
pub mod permission;
pub mod sorting;

pub use error::{QueryError, QueryResult};
pub use expression::{
    DEFAULT_MAX_DEPTH, Evaluator, Lexer, PreparedFilter, Token, TokenKind, parse_filtering,
    parse_filtering_with_depth,
};
pub use pagination::{effective_limit, next_page_info, parse_pagination};
pub use permission::{validate, validate_filtering, validate_sorting};
pub use sorting::parse_sorting;
