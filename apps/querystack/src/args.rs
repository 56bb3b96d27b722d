//! CLI argument parsing using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// querystack - filter, sort, and page JSON-lines records read from stdin
///
/// Values are kept as strings and parsed by the query layer so that errors
/// are reported the same way as for any other client.
#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(name = "querystack")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Filter expression (e.g., "age >= 18 and name ~ '^J'")
    #[arg(long, default_value = "")]
    pub filter: String,

    /// Sort expression (e.g., "last_name, age desc")
    #[arg(long, default_value = "")]
    pub order_by: String,

    /// Page size (default: QUERY_DEFAULT_LIMIT)
    #[arg(long, default_value = "")]
    pub limit: String,

    /// Number of matching records to skip
    #[arg(long, default_value = "")]
    pub offset: String,

    /// JSON permission policy table
    #[arg(long, requires = "object")]
    pub policy: Option<PathBuf>,

    /// Object name to look up in the policy table
    #[arg(long)]
    pub object: Option<String>,
}
