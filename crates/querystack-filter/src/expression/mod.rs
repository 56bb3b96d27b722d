//! Filter expression parsing and evaluation.
//!
//! The pipeline is:
//!
//! 1. **Lexing**: the [`Lexer`] turns the expression string into tokens on demand.
//! 2. **Parsing**: [`parse_filtering`] builds a [`Filtering`](querystack_model::Filtering)
//!    tree by recursive descent.
//! 3. **Evaluation**: the [`Evaluator`] walks the tree against a record.

pub mod evaluator;
pub mod lexer;
pub mod parser;

pub use evaluator::{Evaluator, PreparedFilter};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{DEFAULT_MAX_DEPTH, parse_filtering, parse_filtering_with_depth};
