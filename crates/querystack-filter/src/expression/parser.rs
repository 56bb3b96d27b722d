//! Recursive-descent parser for filter expressions.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! Expr      := OrExpr
//! OrExpr    := AndExpr ( 'or' AndExpr )*
//! AndExpr   := Unary ( 'and' Unary )*
//! Unary     := 'not' Unary | Primary
//! Primary   := '(' Expr ')' | Condition
//! Condition := Field CompOp Literal
//! ```
//!
//! `not` is folded into the governed node's `is_negative` flag, and `!=` /
//! `!~` are stored as negated `==` / `~`.

use std::mem;

use querystack_model::{
    Filtering, NullCondition, NumberCondition, NumberConditionType, StringCondition,
    StringConditionType,
};
use tracing::debug;

use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{QueryError, QueryResult};

/// Deepest filter tree [`parse_filtering`] accepts.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parse a filter expression.
///
/// Returns `Ok(None)` for empty or whitespace-only input. Trees deeper than
/// [`DEFAULT_MAX_DEPTH`] are rejected.
///
/// # Errors
///
/// Returns [`QueryError::UnexpectedSymbol`] for lexical errors,
/// [`QueryError::UnexpectedToken`] for grammar errors, and
/// [`QueryError::NestingTooDeep`] when the expression nests too deeply.
///
/// ```
/// use querystack_filter::parse_filtering;
///
/// let filtering = parse_filtering("age >= 18 and name != 'root'").unwrap().unwrap();
/// assert_eq!(filtering.to_string(), "(age >= 18 and name != 'root')");
/// assert!(parse_filtering("   ").unwrap().is_none());
/// ```
pub fn parse_filtering(input: &str) -> QueryResult<Option<Filtering>> {
    parse_filtering_with_depth(input, DEFAULT_MAX_DEPTH)
}

/// Parse a filter expression, rejecting trees deeper than `max_depth`.
///
/// Depth counts logical operators along the deepest path plus the leaf, so a
/// single condition has depth 1. Parentheses and `not` prefixes also count
/// towards the limit while they are open.
pub fn parse_filtering_with_depth(input: &str, max_depth: usize) -> QueryResult<Option<Filtering>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    let mut parser = Parser::new(input, max_depth)?;
    let (filtering, _) = parser.parse_or_expr()?;
    if parser.peek().kind != TokenKind::Eof {
        return Err(parser.unexpected(&[TokenKind::And, TokenKind::Or, TokenKind::Eof]));
    }
    debug!(
        expression = input,
        nodes = filtering.node_count(),
        "parsed filter expression"
    );
    Ok(Some(filtering))
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// A parsed subtree and its depth.
type Node = (Filtering, usize);

/// Parser holding a single token of lookahead.
struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    max_depth: usize,
    /// Open `(` groups and `not` prefixes on the current path.
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, max_depth: usize) -> QueryResult<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            max_depth,
            nesting: 0,
        })
    }

    fn peek(&self) -> &Token {
        &self.current
    }

    fn advance(&mut self) -> QueryResult<Token> {
        let next = self.lexer.next_token()?;
        Ok(mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, kind: TokenKind) -> QueryResult<Token> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(self.unexpected(&[kind]))
        }
    }

    /// Fail when `depth` exceeds the limit, reporting the current token.
    fn check_depth(&self, depth: usize) -> QueryResult<()> {
        if depth > self.max_depth {
            return Err(QueryError::NestingTooDeep {
                max_depth: self.max_depth,
                position: self.current.position,
            });
        }
        Ok(())
    }

    /// Enter a `(` group or `not` prefix.
    fn descend(&mut self) -> QueryResult<()> {
        self.nesting += 1;
        self.check_depth(self.nesting)
    }

    /// Join two subtrees under a logical operator.
    fn join(
        &self,
        (left, left_depth): Node,
        (right, right_depth): Node,
        make: fn(Filtering, Filtering) -> Filtering,
    ) -> QueryResult<Node> {
        let depth = left_depth.max(right_depth) + 1;
        self.check_depth(depth)?;
        Ok((make(left, right), depth))
    }

    fn unexpected(&self, expected: &[TokenKind]) -> QueryError {
        QueryError::UnexpectedToken {
            token: self.current.to_string(),
            expected: expected.to_vec(),
            position: self.current.position,
        }
    }
}

// ---------------------------------------------------------------------------
// Expressions (precedence climbing)
// ---------------------------------------------------------------------------

impl Parser<'_> {
    /// Parse OR chains (lowest precedence).
    fn parse_or_expr(&mut self) -> QueryResult<Node> {
        let mut left = self.parse_and_expr()?;
        while self.peek().kind == TokenKind::Or {
            self.advance()?;
            let right = self.parse_and_expr()?;
            left = self.join(left, right, Filtering::or)?;
        }
        Ok(left)
    }

    /// Parse AND chains.
    fn parse_and_expr(&mut self) -> QueryResult<Node> {
        let mut left = self.parse_not_expr()?;
        while self.peek().kind == TokenKind::And {
            self.advance()?;
            let right = self.parse_not_expr()?;
            left = self.join(left, right, Filtering::and)?;
        }
        Ok(left)
    }

    /// Parse `not` prefixes.
    fn parse_not_expr(&mut self) -> QueryResult<Node> {
        if self.peek().kind == TokenKind::Not {
            self.descend()?;
            self.advance()?;
            let (node, depth) = self.parse_not_expr()?;
            self.nesting -= 1;
            return Ok((node.negate(), depth));
        }
        self.parse_primary_expr()
    }

    /// Parse a parenthesized group or a single condition.
    fn parse_primary_expr(&mut self) -> QueryResult<Node> {
        match self.peek().kind {
            TokenKind::LParen => {
                self.descend()?;
                self.advance()?;
                let expr = self.parse_or_expr()?;
                self.expect(TokenKind::RParen)?;
                self.nesting -= 1;
                Ok(expr)
            }
            TokenKind::Field => Ok((self.parse_condition()?, 1)),
            _ => Err(self.unexpected(&[TokenKind::Field, TokenKind::Not, TokenKind::LParen])),
        }
    }

    /// Parse `field <op> literal`, checking the literal suits the operator.
    fn parse_condition(&mut self) -> QueryResult<Filtering> {
        let field = self.advance()?;
        let field_path: Vec<String> = field.text.split('.').map(str::to_owned).collect();

        let op = self.peek().kind;
        if !op.is_comparison() {
            return Err(self.unexpected(&TokenKind::COMPARISONS));
        }
        self.advance()?;

        let literal = self.peek().kind;
        let filtering = match (op, literal) {
            (TokenKind::Eq | TokenKind::Ne, TokenKind::String) => {
                let value = self.advance()?.text;
                Filtering::StringCondition(StringCondition {
                    field_path,
                    value,
                    condition_type: StringConditionType::Eq,
                    is_negative: op == TokenKind::Ne,
                })
            }
            (TokenKind::Eq | TokenKind::Ne, TokenKind::Number) => {
                let value = self.parse_number()?;
                Filtering::NumberCondition(NumberCondition {
                    field_path,
                    value,
                    condition_type: NumberConditionType::Eq,
                    is_negative: op == TokenKind::Ne,
                })
            }
            (TokenKind::Eq | TokenKind::Ne, TokenKind::Null) => {
                self.advance()?;
                Filtering::NullCondition(NullCondition {
                    field_path,
                    is_negative: op == TokenKind::Ne,
                })
            }
            (TokenKind::Eq | TokenKind::Ne, _) => {
                return Err(self.unexpected(&[
                    TokenKind::String,
                    TokenKind::Number,
                    TokenKind::Null,
                ]));
            }
            (TokenKind::Match | TokenKind::NotMatch, TokenKind::String) => {
                let value = self.advance()?.text;
                Filtering::StringCondition(StringCondition {
                    field_path,
                    value,
                    condition_type: StringConditionType::Match,
                    is_negative: op == TokenKind::NotMatch,
                })
            }
            (TokenKind::Match | TokenKind::NotMatch, _) => {
                return Err(self.unexpected(&[TokenKind::String]));
            }
            (_, TokenKind::Number) => {
                let value = self.parse_number()?;
                Filtering::NumberCondition(NumberCondition {
                    field_path,
                    value,
                    condition_type: ordering_type(op),
                    is_negative: false,
                })
            }
            _ => return Err(self.unexpected(&[TokenKind::Number])),
        };
        Ok(filtering)
    }

    /// Read a number literal; values that overflow `f64` are rejected.
    fn parse_number(&mut self) -> QueryResult<f64> {
        match self.peek().text.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                self.advance()?;
                Ok(value)
            }
            _ => Err(self.unexpected(&[TokenKind::Number])),
        }
    }
}

/// Map an ordering operator token to its condition type.
fn ordering_type(op: TokenKind) -> NumberConditionType {
    match op {
        TokenKind::Lt => NumberConditionType::Lt,
        TokenKind::Le => NumberConditionType::Le,
        TokenKind::Gt => NumberConditionType::Gt,
        TokenKind::Ge => NumberConditionType::Ge,
        _ => NumberConditionType::Eq,
    }
}
