//! Model types for QueryStack.
//!
//! This crate holds the plain data produced and consumed by the query
//! pipeline: the filter AST, sort criteria, pagination parameters, and the
//! per-field permission policy tables. All types are serde-serializable so
//! they can cross process boundaries or be loaded from generated JSON.
#![allow(clippy::module_name_repetitions)]

pub mod filtering;
pub mod pagination;
pub mod policy;
pub mod sorting;

pub use filtering::{
    Filtering, LogicalOperator, LogicalOperatorType, NullCondition, NumberCondition,
    NumberConditionType, StringCondition, StringConditionType,
};
pub use pagination::{LAST_OFFSET, LAST_PAGE_TOKEN, PageInfo, Pagination};
pub use policy::{FieldPolicy, FilterOperation, PolicyTable, ValueType};
pub use sorting::{SortCriteria, SortOrder, Sorting};
