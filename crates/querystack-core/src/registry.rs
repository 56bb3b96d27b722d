//! Process-wide cache of record field sets.
//!
//! Provides [`FieldRegistry`], a thread-safe concurrent map from a record's
//! [`TypeId`] to its [`FieldSet`]. Each set is built once on first use (or
//! eagerly via [`FieldRegistry::register`]) and never mutated or evicted.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{trace, warn};

use crate::error::{QueryStackError, QueryStackResult};
use crate::record::{FieldSet, Record};

/// Thread-safe registry of field accessors, keyed by record type.
///
/// Uses `DashMap` for concurrent lookup and insertion. Create one at process
/// start and share it (by reference or `Arc`) with every evaluator.
///
/// # Examples
///
/// ```
/// use querystack_core::{AsFieldValue, FieldRegistry, FieldSet, Record};
///
/// struct Item {
///     sku: String,
/// }
///
/// impl Record for Item {
///     fn describe(fields: &mut FieldSet<Self>) {
///         fields.field("sku", |i| i.sku.as_field_value());
///     }
/// }
///
/// let registry = FieldRegistry::new();
/// registry.register::<Item>().unwrap();
/// assert!(registry.contains::<Item>());
/// ```
#[derive(Debug)]
pub struct FieldRegistry {
    inner: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl FieldRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Build and cache the field set of `T`, rejecting duplicate declarations.
    pub fn register<T: Record>(&self) -> QueryStackResult<Arc<FieldSet<T>>> {
        let fields = self.fields::<T>();
        if let Some(field) = fields.duplicates().first() {
            return Err(QueryStackError::DuplicateField {
                type_name: fields.type_name(),
                field: (*field).to_owned(),
            });
        }
        Ok(fields)
    }

    /// Get the field set of `T`, building it on first access.
    #[must_use]
    pub fn fields<T: Record>(&self) -> Arc<FieldSet<T>> {
        let id = TypeId::of::<T>();
        let entry = match self.inner.get(&id) {
            Some(entry) => Arc::clone(entry.value()),
            None => self
                .inner
                .entry(id)
                .or_insert_with(|| Arc::new(build_field_set::<T>()) as Arc<dyn Any + Send + Sync>)
                .clone(),
        };
        // Entries are keyed by `TypeId`, so the downcast cannot fail.
        entry
            .downcast::<FieldSet<T>>()
            .unwrap_or_else(|_| Arc::new(build_field_set::<T>()))
    }

    /// Whether the field set of `T` has been built.
    #[must_use]
    pub fn contains<T: Record>(&self) -> bool {
        self.inner.contains_key(&TypeId::of::<T>())
    }

    /// Number of cached record types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn build_field_set<T: Record>() -> FieldSet<T> {
    let fields = FieldSet::<T>::build();
    if !fields.duplicates().is_empty() {
        warn!(
            type_name = fields.type_name(),
            duplicates = ?fields.duplicates(),
            "record declares duplicate fields; first declaration wins"
        );
    }
    trace!(
        type_name = fields.type_name(),
        fields = fields.len(),
        "built field set"
    );
    fields
}
