//! Sort criteria.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a single sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    /// Ascending (the default).
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Returns the keyword used in sort expressions.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sort key: a field tag and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortCriteria {
    /// Field tag (dotted path) to sort by.
    pub tag: String,
    /// Direction.
    pub order: SortOrder,
}

impl SortCriteria {
    /// Create a criterion.
    pub fn new(tag: impl Into<String>, order: SortOrder) -> Self {
        Self {
            tag: tag.into(),
            order,
        }
    }

    /// Whether this key sorts ascending.
    #[must_use]
    pub fn is_asc(&self) -> bool {
        self.order == SortOrder::Asc
    }

    /// Whether this key sorts descending.
    #[must_use]
    pub fn is_desc(&self) -> bool {
        self.order == SortOrder::Desc
    }
}

impl fmt::Display for SortCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tag, self.order)
    }
}

/// Ordered list of sort keys: primary first, then secondary, and so on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sorting {
    /// Sort keys in priority order.
    pub criteria: Vec<SortCriteria>,
}

impl Sorting {
    /// Build from an ordered list of criteria.
    #[must_use]
    pub fn new(criteria: Vec<SortCriteria>) -> Self {
        Self { criteria }
    }

    /// Iterate the criteria in priority order.
    pub fn iter(&self) -> std::slice::Iter<'_, SortCriteria> {
        self.criteria.iter()
    }

    /// Tags in priority order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.criteria.iter().map(|c| c.tag.as_str())
    }

    /// Number of criteria.
    #[must_use]
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Whether there are no criteria.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl<'a> IntoIterator for &'a Sorting {
    type Item = &'a SortCriteria;
    type IntoIter = std::slice::Iter<'a, SortCriteria>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Sorting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.criteria.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
