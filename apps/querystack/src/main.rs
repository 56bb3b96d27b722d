//! QueryStack CLI - filter, sort, and page JSON-lines records.
//!
//! Reads one JSON document per line from stdin, applies the query given on
//! the command line, and writes the matching page to stdout. Logs go to
//! stderr.
//!
//! # Usage
//!
//! ```text
//! querystack --filter "age >= 18 and name ~ '^J'" --order-by "age desc" --limit 10 < users.jsonl
//! querystack --filter "email == 'a@b.c'" --policy policy.json --object User < users.jsonl
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QUERY_DEFAULT_LIMIT` | `1000` | Page size when `--limit` is not given |
//! | `QUERY_MAX_LIMIT` | `10000` | Upper bound on the page size |
//! | `QUERY_MAX_FILTER_DEPTH` | `64` | Deepest filter tree accepted |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod args;
mod query;

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use querystack_core::{FieldRegistry, QueryStackConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::query::{Query, load_policy, read_records, write_records};

/// Initialize the tracing subscriber, writing to stderr.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = QueryStackConfig::from_env();
    init_tracing(&config.log_level)?;
    config.validate().context("invalid configuration")?;

    let query = Query::parse(&args, &config)?;
    if let (Some(path), Some(object)) = (&args.policy, &args.object) {
        let table = load_policy(path)?;
        query.authorize(&table, object)?;
        info!(object = %object, policy = %path.display(), "query permitted");
    }

    let records = read_records(io::stdin().lock())?;
    let registry = FieldRegistry::new();
    let (page, page_info) = query.run(&records, &registry, &config)?;
    write_records(io::stdout().lock(), &page)?;

    info!(
        read = records.len(),
        written = page.len(),
        page = %page_info,
        "query complete"
    );
    Ok(())
}
