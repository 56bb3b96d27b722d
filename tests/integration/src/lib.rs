//! Integration tests for QueryStack.
//!
//! These tests drive the whole pipeline across crates: parsing raw query
//! strings, evaluating them against typed records and JSON documents, and
//! validating them against permission policies.
//!
//! ```text
//! cargo test -p querystack-integration
//! ```

use std::sync::Once;

use querystack_core::{AsFieldValue, FieldRegistry, FieldSet, FieldValue, Record};
use querystack_model::{FieldPolicy, FilterOperation, PolicyTable, ValueType};

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Postal address nested inside [`User`].
#[derive(Debug, Clone)]
pub struct Address {
    /// City name.
    pub city: String,
    /// Postal code, if known.
    pub zip: Option<u32>,
}

impl Record for Address {
    fn describe(fields: &mut FieldSet<Self>) {
        fields
            .field("city", |a| a.city.as_field_value())
            .field("zip", |a| a.zip.as_field_value());
    }
}

/// Test record with every supported field shape.
#[derive(Debug, Clone)]
pub struct User {
    /// Serialized as `first_name`.
    pub first_name: String,
    /// Optional middle name.
    pub middle_name: Option<String>,
    /// Serialized as `last_name`.
    pub last_name: String,
    /// Age in years.
    pub age: u8,
    /// Account balance.
    pub balance: f64,
    /// Home address.
    pub address: Address,
    /// Line manager, if any.
    pub manager: Option<Box<User>>,
}

impl Record for User {
    fn describe(fields: &mut FieldSet<Self>) {
        fields
            .tagged("first_name", "FirstName", |u| u.first_name.as_field_value())
            .tagged("middle_name", "MiddleName", |u| u.middle_name.as_field_value())
            .tagged("last_name", "LastName", |u| u.last_name.as_field_value())
            .field("age", |u| u.age.as_field_value())
            .field("balance", |u| u.balance.as_field_value())
            .field("address", |u| FieldValue::record(&u.address))
            .field("manager", |u| FieldValue::optional_record(u.manager.as_deref()));
    }
}

/// A registry with the test record types registered.
#[must_use]
pub fn registry() -> FieldRegistry {
    init_tracing();
    let registry = FieldRegistry::new();
    registry
        .register::<User>()
        .and_then(|_| registry.register::<Address>())
        .unwrap_or_else(|e| panic!("test records must register cleanly: {e}"));
    registry
}

/// Jan Kowalski, 42, managed by Ann Lee.
#[must_use]
pub fn jan() -> User {
    User {
        first_name: "Jan".to_owned(),
        middle_name: None,
        last_name: "Kowalski".to_owned(),
        age: 42,
        balance: 1250.5,
        address: Address {
            city: "Kyiv".to_owned(),
            zip: Some(1001),
        },
        manager: Some(Box::new(ann())),
    }
}

/// Ann Lee, 51, no manager.
#[must_use]
pub fn ann() -> User {
    User {
        first_name: "Ann".to_owned(),
        middle_name: Some("Marie".to_owned()),
        last_name: "Lee".to_owned(),
        age: 51,
        balance: -20.0,
        address: Address {
            city: "Lviv".to_owned(),
            zip: None,
        },
        manager: None,
    }
}

/// Policies for the `User` object.
#[must_use]
pub fn user_policies() -> PolicyTable {
    let mut table = PolicyTable::new();
    table
        .insert("User", "first_name", FieldPolicy::deny(&[FilterOperation::Eq]))
        .insert("User", "middle_name", FieldPolicy::default().without_sorting())
        .insert(
            "User",
            "balance",
            FieldPolicy::deny(&[FilterOperation::Eq]).with_value_type(ValueType::Number),
        )
        .insert("User", "manager.last_name", FieldPolicy::deny_all());
    table
}

mod test_filter;
mod test_paging;
mod test_permission;
