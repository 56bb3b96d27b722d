//! Typed field access for filterable records.
//!
//! A type opts into filtering by implementing [`Record`], declaring each
//! field's serialization name and a getter returning a borrowed
//! [`FieldValue`]. The declarations are collected once per type into a
//! [`FieldSet`] and cached by the [`FieldRegistry`].
//!
//! # Examples
//!
//! ```
//! use querystack_core::{AsFieldValue, FieldRegistry, FieldSet, FieldValue, Record, Resolve};
//!
//! struct User {
//!     first_name: String,
//!     age: u32,
//!     nickname: Option<String>,
//! }
//!
//! impl Record for User {
//!     fn describe(fields: &mut FieldSet<Self>) {
//!         fields
//!             .tagged("first_name", "FirstName", |u| u.first_name.as_field_value())
//!             .field("age", |u| u.age.as_field_value())
//!             .field("nickname", |u| u.nickname.as_field_value());
//!     }
//! }
//!
//! let registry = FieldRegistry::new();
//! let user = User { first_name: "Jan".into(), age: 42, nickname: None };
//! let value = user.resolve_field(&registry, "first_name").unwrap();
//! assert_eq!(value.as_str(), Some("Jan"));
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::registry::FieldRegistry;

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// A borrowed view of one field's runtime value.
pub enum FieldValue<'a> {
    /// String-like value.
    Str(&'a str),
    /// Signed integer of any width.
    Int(i64),
    /// Unsigned integer of any width.
    UInt(u64),
    /// Floating-point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// A nested value whose fields can be resolved further.
    Record(&'a dyn Resolve),
    /// A nullable value. `None` is null.
    Optional(Option<Box<FieldValue<'a>>>),
    /// A value the query language cannot compare (lists, maps, bytes).
    Unsupported(&'static str),
}

impl<'a> FieldValue<'a> {
    /// Wrap a nested record.
    pub fn record<R: Resolve>(record: &'a R) -> Self {
        Self::Record(record)
    }

    /// Wrap an optional nested record.
    pub fn optional_record<R: Resolve>(record: Option<&'a R>) -> Self {
        Self::Optional(record.map(|r| Box::new(Self::Record(r))))
    }

    /// Returns `true` for an absent optional value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Optional(None))
    }

    /// Returns `true` if the value is nullable at all.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Strip any present `Optional` wrappers, leaving the underlying value.
    #[must_use]
    pub fn dereference(self) -> Self {
        match self {
            Self::Optional(Some(inner)) => inner.dereference(),
            other => other,
        }
    }

    /// Returns the string content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Self::Str(s) => Some(*s),
            _ => None,
        }
    }

    /// Returns the value widened to `f64`, if this is numeric.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::UInt(u) => Some(*u as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Short human-readable name of the value's category.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Record(_) => "record",
            Self::Optional(None) => "null",
            Self::Optional(Some(inner)) => inner.kind(),
            Self::Unsupported(kind) => *kind,
        }
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::UInt(u) => f.debug_tuple("UInt").field(u).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Record(_) => f.write_str("Record(..)"),
            Self::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            Self::Unsupported(kind) => f.debug_tuple("Unsupported").field(kind).finish(),
        }
    }
}

/// Conversion of plain field types into a [`FieldValue`].
pub trait AsFieldValue {
    /// Borrow `self` as a field value.
    fn as_field_value(&self) -> FieldValue<'_>;
}

impl AsFieldValue for String {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Str(self)
    }
}

impl AsFieldValue for str {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Str(self)
    }
}

impl AsFieldValue for bool {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Bool(*self)
    }
}

macro_rules! impl_as_field_value {
    ($variant:ident => $wide:ty: $($ty:ty),+) => {
        $(
            impl AsFieldValue for $ty {
                fn as_field_value(&self) -> FieldValue<'_> {
                    FieldValue::$variant(<$wide>::from(*self))
                }
            }
        )+
    };
}

impl_as_field_value!(Int => i64: i8, i16, i32, i64);
impl_as_field_value!(UInt => u64: u8, u16, u32, u64);
impl_as_field_value!(Float => f64: f32, f64);

impl<T: AsFieldValue> AsFieldValue for Option<T> {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Optional(self.as_ref().map(|v| Box::new(v.as_field_value())))
    }
}

impl<T> AsFieldValue for Vec<T> {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Unsupported("list")
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// A value whose named fields can be looked up one path segment at a time.
pub trait Resolve {
    /// Look up the field `name` on `self`.
    ///
    /// Returns `None` when no such field exists.
    fn resolve_field<'a>(
        &'a self,
        registry: &FieldRegistry,
        name: &str,
    ) -> Option<FieldValue<'a>>;
}

/// A type with a statically declared set of filterable fields.
pub trait Record: Sized + 'static {
    /// Declare the type's fields.
    fn describe(fields: &mut FieldSet<Self>);
}

impl<T: Record> Resolve for T {
    fn resolve_field<'a>(
        &'a self,
        registry: &FieldRegistry,
        name: &str,
    ) -> Option<FieldValue<'a>> {
        let fields = registry.fields::<T>();
        let getter = fields.lookup(name)?.getter;
        Some(getter(self))
    }
}

/// JSON objects resolve by key. Every member is nullable.
impl Resolve for serde_json::Value {
    fn resolve_field<'a>(
        &'a self,
        _registry: &FieldRegistry,
        name: &str,
    ) -> Option<FieldValue<'a>> {
        let object = self.as_object()?;
        let value = object.get(name).or_else(|| {
            object
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })?;
        Some(json_field_value(value))
    }
}

fn json_field_value(value: &serde_json::Value) -> FieldValue<'_> {
    use serde_json::Value;

    let inner = match value {
        Value::Null => return FieldValue::Optional(None),
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                FieldValue::UInt(u)
            } else {
                n.as_f64()
                    .map_or(FieldValue::Unsupported("number"), FieldValue::Float)
            }
        }
        Value::String(s) => FieldValue::Str(s),
        Value::Array(_) => FieldValue::Unsupported("array"),
        Value::Object(_) => FieldValue::Record(value),
    };
    FieldValue::Optional(Some(Box::new(inner)))
}

// ---------------------------------------------------------------------------
// Field sets
// ---------------------------------------------------------------------------

/// Getter for a single declared field.
pub type Getter<T> = for<'a> fn(&'a T) -> FieldValue<'a>;

/// One declared field: its serialization name, member name, and getter.
pub struct FieldAccessor<T> {
    name: &'static str,
    member: &'static str,
    getter: Getter<T>,
}

impl<T> FieldAccessor<T> {
    /// Serialization name (e.g. the JSON/protobuf name).
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Language-level member name.
    #[must_use]
    pub fn member(&self) -> &'static str {
        self.member
    }

    /// Read the field from `record`.
    pub fn get<'a>(&self, record: &'a T) -> FieldValue<'a> {
        (self.getter)(record)
    }
}

impl<T> fmt::Debug for FieldAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("name", &self.name)
            .field("member", &self.member)
            .finish_non_exhaustive()
    }
}

/// All declared fields of a record type, indexed for lookup.
///
/// Lookup tries the exact serialization name first, then falls back to a
/// case-insensitive match on the member name.
pub struct FieldSet<T> {
    type_name: &'static str,
    accessors: Vec<FieldAccessor<T>>,
    by_name: HashMap<&'static str, usize>,
    by_member: HashMap<String, usize>,
    duplicates: Vec<&'static str>,
}

impl<T: Record> FieldSet<T> {
    /// Collect the declarations of `T`.
    #[must_use]
    pub fn build() -> Self {
        let mut set = Self {
            type_name: std::any::type_name::<T>(),
            accessors: Vec::new(),
            by_name: HashMap::new(),
            by_member: HashMap::new(),
            duplicates: Vec::new(),
        };
        T::describe(&mut set);
        set
    }
}

impl<T> FieldSet<T> {
    /// Declare a field whose serialization name equals its member name.
    pub fn field(&mut self, name: &'static str, getter: Getter<T>) -> &mut Self {
        self.tagged(name, name, getter)
    }

    /// Declare a field with a distinct serialization name (`tag`).
    ///
    /// The first declaration of a name wins; repeats are recorded and
    /// reported by [`FieldSet::duplicates`].
    pub fn tagged(
        &mut self,
        tag: &'static str,
        member: &'static str,
        getter: Getter<T>,
    ) -> &mut Self {
        if self.by_name.contains_key(tag) {
            self.duplicates.push(tag);
            return self;
        }
        let index = self.accessors.len();
        self.accessors.push(FieldAccessor {
            name: tag,
            member,
            getter,
        });
        self.by_name.insert(tag, index);
        self.by_member
            .entry(member.to_ascii_lowercase())
            .or_insert(index);
        self
    }

    /// Find the accessor for a path segment.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&FieldAccessor<T>> {
        let index = self
            .by_name
            .get(name)
            .or_else(|| self.by_member.get(&name.to_ascii_lowercase()))?;
        self.accessors.get(*index)
    }

    /// Fully qualified name of the described type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Serialization names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.accessors.iter().map(|a| a.name)
    }

    /// Names that were declared more than once.
    #[must_use]
    pub fn duplicates(&self) -> &[&'static str] {
        &self.duplicates
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    /// Whether no fields were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}

impl<T> fmt::Debug for FieldSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSet")
            .field("type_name", &self.type_name)
            .field("accessors", &self.accessors)
            .finish_non_exhaustive()
    }
}
