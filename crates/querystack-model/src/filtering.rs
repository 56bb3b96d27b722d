//! Filter expression AST.
//!
//! A parsed filter is a tree of [`Filtering`] nodes: binary logical operators
//! over string, number, and null conditions. Negation never appears as a node
//! of its own; it is folded into the `is_negative` flag of the node it governs,
//! so `field != 'x'` and `not field == 'x'` produce the same tree.
//!
//! Every node renders back into canonical expression text via `Display`.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Logical connective of a [`LogicalOperator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperatorType {
    /// Both sides must hold.
    And,
    /// At least one side must hold.
    Or,
}

impl LogicalOperatorType {
    /// Returns the keyword used in expression text.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for LogicalOperatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison performed by a [`StringCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StringConditionType {
    /// Exact equality (`==`).
    Eq,
    /// Regular-expression match (`~`).
    Match,
}

impl StringConditionType {
    /// Returns the upper-case name of the comparison.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Match => "MATCH",
        }
    }
}

impl fmt::Display for StringConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison performed by a [`NumberCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NumberConditionType {
    /// Equal (`==`).
    Eq,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
}

impl NumberConditionType {
    /// Returns the upper-case name of the comparison.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::Gt => "GT",
            Self::Ge => "GE",
        }
    }

    /// Returns the operator symbol used in expression text.
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for NumberConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Root of a filter AST, and the variant type of each operator side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filtering {
    /// Binary logical operator.
    Operator(LogicalOperator),
    /// Condition on a string field.
    StringCondition(StringCondition),
    /// Condition on a numeric field.
    NumberCondition(NumberCondition),
    /// Nullability test.
    NullCondition(NullCondition),
}

/// `left and right` / `left or right`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalOperator {
    /// Left-hand side.
    pub left: Box<Filtering>,
    /// Right-hand side.
    pub right: Box<Filtering>,
    /// Connective.
    pub op_type: LogicalOperatorType,
    /// Whether the combined result is inverted.
    pub is_negative: bool,
}

/// `field == 'value'` or `field ~ 'pattern'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringCondition {
    /// Dotted path split into segments.
    pub field_path: Vec<String>,
    /// Literal value or regular expression.
    pub value: String,
    /// Comparison type.
    pub condition_type: StringConditionType,
    /// Whether the result is inverted.
    pub is_negative: bool,
}

/// `field <op> number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberCondition {
    /// Dotted path split into segments.
    pub field_path: Vec<String>,
    /// Literal value.
    pub value: f64,
    /// Comparison type.
    pub condition_type: NumberConditionType,
    /// Whether the result is inverted.
    pub is_negative: bool,
}

/// `field == null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullCondition {
    /// Dotted path split into segments.
    pub field_path: Vec<String>,
    /// Whether the result is inverted (`field != null`).
    pub is_negative: bool,
}

impl LogicalOperator {
    /// Combine two nodes with `op_type`.
    #[must_use]
    pub fn new(left: Filtering, op_type: LogicalOperatorType, right: Filtering) -> Self {
        Self {
            left: Box::new(left),
            right: Box::new(right),
            op_type,
            is_negative: false,
        }
    }
}

impl Filtering {
    /// `left and right`.
    #[must_use]
    pub fn and(left: Self, right: Self) -> Self {
        Self::Operator(LogicalOperator::new(left, LogicalOperatorType::And, right))
    }

    /// `left or right`.
    #[must_use]
    pub fn or(left: Self, right: Self) -> Self {
        Self::Operator(LogicalOperator::new(left, LogicalOperatorType::Or, right))
    }

    /// Flip the negation flag of this node.
    #[must_use]
    pub fn negate(mut self) -> Self {
        match &mut self {
            Self::Operator(op) => op.is_negative = !op.is_negative,
            Self::StringCondition(c) => c.is_negative = !c.is_negative,
            Self::NumberCondition(c) => c.is_negative = !c.is_negative,
            Self::NullCondition(c) => c.is_negative = !c.is_negative,
        }
        self
    }

    /// Whether this node's result is inverted.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        match self {
            Self::Operator(op) => op.is_negative,
            Self::StringCondition(c) => c.is_negative,
            Self::NumberCondition(c) => c.is_negative,
            Self::NullCondition(c) => c.is_negative,
        }
    }

    /// The field path of a leaf condition; `None` for operators.
    #[must_use]
    pub fn field_path(&self) -> Option<&[String]> {
        match self {
            Self::Operator(_) => None,
            Self::StringCondition(c) => Some(&c.field_path),
            Self::NumberCondition(c) => Some(&c.field_path),
            Self::NullCondition(c) => Some(&c.field_path),
        }
    }

    /// Dotted field paths of all leaves, left to right.
    #[must_use]
    pub fn field_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths(&self, paths: &mut Vec<String>) {
        match self {
            Self::Operator(op) => {
                op.left.collect_paths(paths);
                op.right.collect_paths(paths);
            }
            leaf => {
                if let Some(path) = leaf.field_path() {
                    paths.push(path.join("."));
                }
            }
        }
    }

    /// Total number of nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            Self::Operator(op) => 1 + op.left.node_count() + op.right.node_count(),
            _ => 1,
        }
    }

    /// Depth of the tree; a single leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Operator(op) => 1 + op.left.depth().max(op.right.depth()),
            _ => 1,
        }
    }
}

impl From<LogicalOperator> for Filtering {
    fn from(op: LogicalOperator) -> Self {
        Self::Operator(op)
    }
}

impl From<StringCondition> for Filtering {
    fn from(c: StringCondition) -> Self {
        Self::StringCondition(c)
    }
}

impl From<NumberCondition> for Filtering {
    fn from(c: NumberCondition) -> Self {
        Self::NumberCondition(c)
    }
}

impl From<NullCondition> for Filtering {
    fn from(c: NullCondition) -> Self {
        Self::NullCondition(c)
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

impl fmt::Display for Filtering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operator(op) => write!(f, "{op}"),
            Self::StringCondition(c) => write!(f, "{c}"),
            Self::NumberCondition(c) => write!(f, "{c}"),
            Self::NullCondition(c) => write!(f, "{c}"),
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative {
            f.write_str("not ")?;
        }
        write!(f, "({} {} {})", self.left, self.op_type, self.right)
    }
}

impl fmt::Display for StringCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match (self.condition_type, self.is_negative) {
            (StringConditionType::Eq, false) => "==",
            (StringConditionType::Eq, true) => "!=",
            (StringConditionType::Match, false) => "~",
            (StringConditionType::Match, true) => "!~",
        };
        // No escapes exist, so pick the quote the value does not contain.
        let quote = if self.value.contains('\'') { '"' } else { '\'' };
        write!(
            f,
            "{} {op} {quote}{}{quote}",
            self.field_path.join("."),
            self.value
        )
    }
}

impl fmt::Display for NumberCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.field_path.join(".");
        match (self.condition_type, self.is_negative) {
            (NumberConditionType::Eq, true) => write!(f, "{path} != {}", self.value),
            (ty, true) => write!(f, "not {path} {} {}", ty.symbol(), self.value),
            (ty, false) => write!(f, "{path} {} {}", ty.symbol(), self.value),
        }
    }
}

impl fmt::Display for NullCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.is_negative { "!=" } else { "==" };
        write!(f, "{} {op} null", self.field_path.join("."))
    }
}
