//! Error types for the QueryStack core.

/// Core error type for QueryStack infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum QueryStackError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A record type declared the same field name twice.
    #[error("duplicate field '{field}' declared by {type_name}")]
    DuplicateField {
        /// Name of the offending record type.
        type_name: &'static str,
        /// The repeated serialization name.
        field: String,
    },
}

/// Convenience result type for QueryStack core operations.
pub type QueryStackResult<T> = Result<T, QueryStackError>;
