//! Per-field permission policies.
//!
//! A [`PolicyTable`] maps an object name and a field name to a
//! [`FieldPolicy`] listing the filter operations that field refuses, whether
//! it may be sorted on, and optionally the literal type its filters must use.
//! Fields without an entry are unrestricted.
//!
//! Tables are usually generated and shipped as JSON:
//!
//! ```
//! use querystack_model::{FilterOperation, PolicyTable};
//!
//! let table = PolicyTable::from_json(r#"{
//!     "User": {
//!         "first_name": { "denied": ["EQ"] },
//!         "middle_name": { "sorting_disabled": true }
//!     }
//! }"#).unwrap();
//!
//! let policy = table.field("User", "first_name").unwrap();
//! assert!(policy.is_denied(FilterOperation::Eq));
//! assert!(!policy.is_denied(FilterOperation::Match));
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A filter operation as seen by the permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterOperation {
    /// Equality, including `!=` and null tests.
    Eq,
    /// Regular-expression match.
    Match,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
}

impl FilterOperation {
    /// Every operation.
    pub const ALL: [Self; 6] = [
        Self::Eq,
        Self::Match,
        Self::Gt,
        Self::Ge,
        Self::Lt,
        Self::Le,
    ];

    /// Returns the upper-case name of the operation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Match => "MATCH",
            Self::Gt => "GT",
            Self::Ge => "GE",
            Self::Lt => "LT",
            Self::Le => "LE",
        }
    }
}

impl fmt::Display for FilterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal type a field's filters must use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueType {
    /// Quoted string literals.
    String,
    /// Numeric literals.
    Number,
}

impl ValueType {
    /// Returns the upper-case name of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Number => "NUMBER",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Restrictions on a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPolicy {
    /// Operations that may not be used in filters on this field.
    #[serde(default)]
    pub denied: Vec<FilterOperation>,
    /// Whether sorting on this field is refused.
    #[serde(default)]
    pub sorting_disabled: bool,
    /// Required literal type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
}

impl FieldPolicy {
    /// A policy that denies `ops`.
    #[must_use]
    pub fn deny(ops: &[FilterOperation]) -> Self {
        Self {
            denied: ops.to_vec(),
            ..Self::default()
        }
    }

    /// A policy that denies every filter operation.
    #[must_use]
    pub fn deny_all() -> Self {
        Self::deny(&FilterOperation::ALL)
    }

    /// Refuse sorting on this field.
    #[must_use]
    pub fn without_sorting(mut self) -> Self {
        self.sorting_disabled = true;
        self
    }

    /// Require literals of `value_type`.
    #[must_use]
    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Whether `op` is denied.
    #[must_use]
    pub fn is_denied(&self, op: FilterOperation) -> bool {
        self.denied.contains(&op)
    }
}

/// Policies keyed by object name, then field name (dotted path).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyTable {
    objects: HashMap<String, HashMap<String, FieldPolicy>>,
}

impl PolicyTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the policy for `object.field`, replacing any previous one.
    pub fn insert(
        &mut self,
        object: impl Into<String>,
        field: impl Into<String>,
        policy: FieldPolicy,
    ) -> &mut Self {
        self.objects
            .entry(object.into())
            .or_default()
            .insert(field.into(), policy);
        self
    }

    /// All field policies of `object`.
    #[must_use]
    pub fn object(&self, object: &str) -> Option<&HashMap<String, FieldPolicy>> {
        self.objects.get(object)
    }

    /// The policy for `object.field`, if one exists.
    #[must_use]
    pub fn field(&self, object: &str, field: &str) -> Option<&FieldPolicy> {
        self.objects.get(object)?.get(field)
    }

    /// Number of objects with policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the table has no policies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
