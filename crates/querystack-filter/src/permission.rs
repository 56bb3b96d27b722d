//! Permission checks for filters and sort keys.
//!
//! Each leaf of a filter is mapped to a [`FilterOperation`] and looked up in
//! the [`PolicyTable`] under its dotted field path. The first violation
//! aborts the walk. Objects or fields without a policy are unrestricted.

use std::collections::HashMap;

use querystack_model::{
    FieldPolicy, FilterOperation, Filtering, NumberConditionType, PolicyTable, Sorting,
    StringConditionType, ValueType,
};
use tracing::debug;

use crate::error::{QueryError, QueryResult};

/// Validate a filter and a sorting against the policies of `object`.
///
/// The filter is checked first.
///
/// # Errors
///
/// Returns [`QueryError::OperationDenied`], [`QueryError::InvalidLiteralType`],
/// or [`QueryError::SortingDisabled`] for the first violation found.
///
/// ```
/// use querystack_filter::{parse_filtering, validate};
/// use querystack_model::{FieldPolicy, FilterOperation, PolicyTable};
///
/// let mut table = PolicyTable::new();
/// table.insert("User", "first_name", FieldPolicy::deny(&[FilterOperation::Eq]));
///
/// let denied = parse_filtering("first_name == 'Jan'").unwrap();
/// assert!(validate(denied.as_ref(), None, &table, "User").is_err());
///
/// let allowed = parse_filtering("first_name ~ 'Jan.*'").unwrap();
/// assert!(validate(allowed.as_ref(), None, &table, "User").is_ok());
/// ```
pub fn validate(
    filtering: Option<&Filtering>,
    sorting: Option<&Sorting>,
    table: &PolicyTable,
    object: &str,
) -> QueryResult<()> {
    if let Some(filtering) = filtering {
        validate_filtering(filtering, table, object)?;
    }
    if let Some(sorting) = sorting {
        validate_sorting(sorting, table, object)?;
    }
    Ok(())
}

/// Validate every condition of `filtering`, left to right.
pub fn validate_filtering(filtering: &Filtering, table: &PolicyTable, object: &str) -> QueryResult<()> {
    match table.object(object) {
        Some(policies) => check_node(filtering, policies),
        None => Ok(()),
    }
}

/// Validate that every sort key may be sorted on.
pub fn validate_sorting(sorting: &Sorting, table: &PolicyTable, object: &str) -> QueryResult<()> {
    let Some(policies) = table.object(object) else {
        return Ok(());
    };
    for criteria in sorting {
        if policies.get(&criteria.tag).is_some_and(|p| p.sorting_disabled) {
            debug!(object, field = %criteria.tag, "sorting denied");
            return Err(QueryError::SortingDisabled {
                field: criteria.tag.clone(),
            });
        }
    }
    Ok(())
}

fn check_node(node: &Filtering, policies: &HashMap<String, FieldPolicy>) -> QueryResult<()> {
    match node {
        Filtering::Operator(op) => {
            check_node(&op.left, policies)?;
            check_node(&op.right, policies)
        }
        Filtering::StringCondition(cond) => {
            let operation = match cond.condition_type {
                StringConditionType::Eq => FilterOperation::Eq,
                StringConditionType::Match => FilterOperation::Match,
            };
            check_leaf(policies, &cond.field_path, operation, Some(ValueType::String))
        }
        Filtering::NumberCondition(cond) => {
            let operation = match cond.condition_type {
                NumberConditionType::Eq => FilterOperation::Eq,
                NumberConditionType::Lt => FilterOperation::Lt,
                NumberConditionType::Le => FilterOperation::Le,
                NumberConditionType::Gt => FilterOperation::Gt,
                NumberConditionType::Ge => FilterOperation::Ge,
            };
            check_leaf(policies, &cond.field_path, operation, Some(ValueType::Number))
        }
        Filtering::NullCondition(cond) => {
            check_leaf(policies, &cond.field_path, FilterOperation::Eq, None)
        }
    }
}

fn check_leaf(
    policies: &HashMap<String, FieldPolicy>,
    field_path: &[String],
    operation: FilterOperation,
    literal: Option<ValueType>,
) -> QueryResult<()> {
    let field = field_path.join(".");
    let Some(policy) = policies.get(&field) else {
        return Ok(());
    };
    if policy.is_denied(operation) {
        debug!(field = %field, %operation, "filter operation denied");
        return Err(QueryError::OperationDenied { field, operation });
    }
    if let (Some(expected), Some(actual)) = (policy.value_type, literal) {
        if expected != actual {
            debug!(field = %field, %expected, %actual, "filter literal type denied");
            return Err(QueryError::InvalidLiteralType { field, expected });
        }
    }
    Ok(())
}
