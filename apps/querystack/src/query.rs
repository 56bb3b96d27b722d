//! The filter, sort, and page pipeline applied to a batch of records.

use std::cmp::Ordering;
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use querystack_core::{FieldRegistry, FieldValue, QueryStackConfig, Resolve};
use querystack_filter::{
    Evaluator, PreparedFilter, effective_limit, next_page_info, parse_filtering_with_depth,
    parse_pagination, parse_sorting, validate,
};
use querystack_model::{PageInfo, Pagination, PolicyTable, Sorting};
use serde_json::Value;
use tracing::debug;

use crate::args::Args;

/// A parsed query ready to run.
#[derive(Debug, Clone)]
pub struct Query {
    /// Filter with compiled patterns; an empty filter matches everything.
    pub filter: PreparedFilter,
    /// Sort keys in priority order.
    pub sorting: Sorting,
    /// Requested page.
    pub pagination: Pagination,
}

impl Query {
    /// Parse the query parameters from the command line.
    pub fn parse(args: &Args, config: &QueryStackConfig) -> Result<Self> {
        let filtering = parse_filtering_with_depth(&args.filter, config.max_filter_depth)
            .context("invalid --filter")?;
        let filter = PreparedFilter::new(filtering).context("invalid --filter")?;
        let sorting = parse_sorting(&args.order_by).context("invalid --order-by")?;
        let pagination = parse_pagination(&args.limit, &args.offset, "")
            .context("invalid --limit/--offset")?;
        Ok(Self {
            filter,
            sorting,
            pagination,
        })
    }

    /// Check the query against the policies of `object`.
    pub fn authorize(&self, table: &PolicyTable, object: &str) -> Result<()> {
        validate(self.filter.filtering(), Some(&self.sorting), table, object)
            .with_context(|| format!("query not permitted for {object}"))
    }

    /// Filter, sort, and window `records`, returning the page and its info.
    pub fn run<'a>(
        &self,
        records: &'a [Value],
        registry: &FieldRegistry,
        config: &QueryStackConfig,
    ) -> Result<(Vec<&'a Value>, PageInfo)> {
        let evaluator = Evaluator::new(registry);
        let mut matched = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let keep = evaluator
                .matches(&self.filter, record)
                .with_context(|| format!("failed to evaluate record {}", index + 1))?;
            if keep {
                matched.push(record);
            }
        }
        debug!(total = records.len(), matched = matched.len(), "filtered records");

        if !self.sorting.is_empty() {
            matched.sort_by(|a, b| compare_records(registry, *a, *b, &self.sorting));
        }

        let offset = usize::try_from(self.pagination.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(effective_limit(&self.pagination, config)).unwrap_or(usize::MAX);
        let page: Vec<&Value> = matched.into_iter().skip(offset).take(limit).collect();
        let info = next_page_info(&self.pagination, config, page.len());
        Ok((page, info))
    }
}

/// Load a JSON policy table from `path`.
pub fn load_policy(path: &Path) -> Result<PolicyTable> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read policy file {}", path.display()))?;
    PolicyTable::from_json(&json)
        .with_context(|| format!("invalid policy file {}", path.display()))
}

/// Read one JSON document per non-blank line.
pub fn read_records(reader: impl BufRead) -> Result<Vec<Value>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("line {} is not valid JSON", index + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Write one compact JSON document per line.
pub fn write_records(mut writer: impl Write, records: &[&Value]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Comparable projection of a field value. Variants are ordered by rank.
#[derive(Debug, Clone, Copy)]
enum SortKey<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Str(&'a str),
    Other,
}

impl SortKey<'_> {
    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Number(_) => 2,
            Self::Str(_) => 3,
            Self::Other => 4,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl<'a> From<FieldValue<'a>> for SortKey<'a> {
    fn from(value: FieldValue<'a>) -> Self {
        match value.dereference() {
            FieldValue::Optional(None) => Self::Null,
            FieldValue::Bool(b) => Self::Bool(b),
            FieldValue::Str(s) => Self::Str(s),
            other => other.as_f64().map_or(Self::Other, Self::Number),
        }
    }
}

/// Resolve the dotted `tag` on `record`; missing fields sort as null.
fn sort_key<'a>(registry: &FieldRegistry, record: &'a dyn Resolve, tag: &str) -> SortKey<'a> {
    let mut current = record;
    let mut segments = tag.split('.').peekable();
    while let Some(segment) = segments.next() {
        let Some(value) = current.resolve_field(registry, segment) else {
            return SortKey::Null;
        };
        if segments.peek().is_none() {
            return SortKey::from(value);
        }
        match value.dereference() {
            FieldValue::Record(next) => current = next,
            _ => return SortKey::Null,
        }
    }
    SortKey::Null
}

fn compare_records(
    registry: &FieldRegistry,
    a: &Value,
    b: &Value,
    sorting: &Sorting,
) -> Ordering {
    for criteria in sorting {
        let tag = criteria.tag.as_str();
        let ordering = sort_key(registry, a, tag).compare(&sort_key(registry, b, tag));
        let ordering = if criteria.is_desc() {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
