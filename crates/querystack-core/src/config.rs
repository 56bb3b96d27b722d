//! Configuration management for QueryStack.
//!
//! Provides [`QueryStackConfig`], the caller-side defaults applied on top of
//! parsed queries. All configuration is driven by environment variables.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{QueryStackError, QueryStackResult};

/// Limit applied when a request does not specify one.
const DEFAULT_LIMIT: u32 = 1000;

/// Largest limit a request may ask for.
const DEFAULT_MAX_LIMIT: u32 = 10_000;

/// Deepest filter tree a request may send.
const DEFAULT_MAX_FILTER_DEPTH: usize = 64;

/// Global configuration for QueryStack.
///
/// # Examples
///
/// ```
/// use querystack_core::QueryStackConfig;
///
/// let config = QueryStackConfig::default();
/// assert_eq!(config.default_limit, 1000);
/// assert_eq!(config.max_limit, 10_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct QueryStackConfig {
    /// Page size used when a request leaves `_limit` unset.
    #[builder(default = DEFAULT_LIMIT)]
    pub default_limit: u32,

    /// Upper bound applied to any requested page size.
    #[builder(default = DEFAULT_MAX_LIMIT)]
    pub max_limit: u32,

    /// Deepest filter tree accepted from a request.
    #[builder(default = DEFAULT_MAX_FILTER_DEPTH)]
    pub max_filter_depth: usize,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for QueryStackConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
            max_filter_depth: DEFAULT_MAX_FILTER_DEPTH,
            log_level: String::from("info"),
        }
    }
}

impl QueryStackConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `QUERY_DEFAULT_LIMIT` | `1000` |
    /// | `QUERY_MAX_LIMIT` | `10000` |
    /// | `QUERY_MAX_FILTER_DEPTH` | `64` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// Values that do not parse as unsigned integers are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("QUERY_DEFAULT_LIMIT") {
            if let Ok(n) = v.trim().parse::<u32>() {
                config.default_limit = n;
            }
        }
        if let Ok(v) = std::env::var("QUERY_MAX_LIMIT") {
            if let Ok(n) = v.trim().parse::<u32>() {
                config.max_limit = n;
            }
        }
        if let Ok(v) = std::env::var("QUERY_MAX_FILTER_DEPTH") {
            if let Ok(n) = v.trim().parse::<usize>() {
                config.max_filter_depth = n;
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Check that the configured limits are consistent.
    pub fn validate(&self) -> QueryStackResult<()> {
        if self.max_limit == 0 {
            return Err(QueryStackError::Config(
                "max_limit must be greater than zero".to_owned(),
            ));
        }
        if self.max_filter_depth == 0 {
            return Err(QueryStackError::Config(
                "max_filter_depth must be greater than zero".to_owned(),
            ));
        }
        if self.default_limit > self.max_limit {
            return Err(QueryStackError::Config(format!(
                "default_limit ({}) exceeds max_limit ({})",
                self.default_limit, self.max_limit
            )));
        }
        Ok(())
    }

    /// Resolve the page size for a request: `0` means "use the default",
    /// anything else is clamped to `max_limit`.
    #[must_use]
    pub fn effective_limit(&self, requested: u32) -> u32 {
        if requested == 0 {
            self.default_limit.min(self.max_limit)
        } else {
            requested.min(self.max_limit)
        }
    }
}
