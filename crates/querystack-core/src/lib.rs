//! Core types, configuration, and the field-accessor registry for QueryStack.
//!
//! This crate provides the building blocks shared by the query crates: the
//! environment-driven [`QueryStackConfig`], the [`QueryStackError`] type, and
//! the [`FieldRegistry`] that maps record types to typed field getters so the
//! filter evaluator can resolve field paths without runtime introspection.

mod config;
mod error;
mod record;
mod registry;

pub use config::QueryStackConfig;
pub use error::{QueryStackError, QueryStackResult};
pub use record::{AsFieldValue, FieldAccessor, FieldSet, FieldValue, Getter, Record, Resolve};
pub use registry::FieldRegistry;
