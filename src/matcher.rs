use crate::catalog::CatalogRecord;
use crate::normalize::normalize;
use crate::page::{Anchor, PageRow};
use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// Normalized values a page row must contain for a record to match it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchCriterion {
    pub tokens: BTreeSet<String>,
}

impl MatchCriterion {
    /// Columns missing from the record, or empty in it, add no token.
    pub fn for_record(record: &CatalogRecord, columns: &[String]) -> Self {
        let tokens = columns
            .iter()
            .filter_map(|c| record.value(c))
            .map(normalize)
            .collect();
        Self { tokens }
    }

    pub fn is_satisfied_by(&self, row: &PageRow) -> bool {
        self.tokens.iter().all(|t| row.contains(t))
    }
}

/// Every (record, row) pair where the row holds all of the record's criterion
/// tokens, in row order then catalog order.
pub fn find_matches<'a>(
    rows: &'a [PageRow],
    catalog: &'a [CatalogRecord],
    columns: &[String],
) -> Vec<(&'a CatalogRecord, &'a PageRow)> {
    let criteria: Vec<MatchCriterion> = catalog
        .iter()
        .map(|r| MatchCriterion::for_record(r, columns))
        .collect();

    let mut out = Vec::new();
    for row in rows {
        for (record, criterion) in catalog.iter().zip(&criteria) {
            if criterion.is_satisfied_by(row) {
                out.push((record, row));
            }
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct TypeFilter {
    pub allowed: HashSet<String>,
    pub separator: String,
}

impl TypeFilter {
    pub fn new<I, S>(allowed: I, separator: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            separator: separator.into(),
        }
    }

    pub fn load(path: &Path, separator: &str) -> Result<Self> {
        let types = crate::inputs::read_lines(path)
            .with_context(|| format!("reading types file: {}", path.display()))?;
        Ok(Self::new(types, separator))
    }

    /// Text before the first separator; the whole label when there is none.
    pub fn type_of<'l>(&self, label: &'l str) -> &'l str {
        label.split(self.separator.as_str()).next().unwrap_or(label)
    }

    /// Case-sensitive: labels are not normalized.
    pub fn accepts(&self, label: &str) -> bool {
        self.allowed.contains(self.type_of(label))
    }
}

/// Anchors of a matched row whose type prefix is allowed, with that prefix.
pub fn eligible_links<'r>(row: &'r PageRow, filter: &TypeFilter) -> Vec<(&'r Anchor, &'r str)> {
    row.anchors
        .iter()
        .filter(|a| filter.accepts(&a.label))
        .map(|a| (a, filter.type_of(&a.label)))
        .collect()
}
