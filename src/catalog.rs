use calamine::{Data, Reader, open_workbook_auto};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("opening catalog {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("catalog {0} has no worksheets")]
    NoSheets(PathBuf),
    #[error("catalog {path} has no worksheet named {sheet:?}")]
    MissingSheet { path: PathBuf, sheet: String },
    #[error("catalog {0} has no header row")]
    NoHeader(PathBuf),
}

/// One data row of the catalog, keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRecord {
    cells: BTreeMap<String, String>,
}

impl CatalogRecord {
    pub fn new(cells: BTreeMap<String, String>) -> Self {
        Self { cells }
    }

    /// Non-empty value of `column`. Empty cells read the same as missing ones.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn cells(&self) -> &BTreeMap<String, String> {
        &self.cells
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CatalogRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Zips every row after the header with the header names, then drops the
/// first `skip_after_header` records.
pub fn records_from_rows<I>(mut rows: I, skip_after_header: usize) -> Option<Vec<CatalogRecord>>
where
    I: Iterator<Item = Vec<String>>,
{
    let header = rows.next()?;
    let records: Vec<CatalogRecord> = rows
        .skip(skip_after_header)
        .map(|row| {
            header
                .iter()
                .zip(row)
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, value)| (name.clone(), value))
                .collect::<CatalogRecord>()
        })
        .collect();
    Some(records)
}

pub fn load_catalog(
    path: &Path,
    sheet: Option<&str>,
    skip_after_header: usize,
) -> Result<Vec<CatalogRecord>, CatalogError> {
    let open_err = |source| CatalogError::Open {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(open_err)?;

    let name = match sheet {
        Some(s) => {
            if !workbook.sheet_names().iter().any(|n| n == s) {
                return Err(CatalogError::MissingSheet {
                    path: path.to_path_buf(),
                    sheet: s.to_string(),
                });
            }
            s.to_string()
        }
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| CatalogError::NoSheets(path.to_path_buf()))?,
    };

    let range = workbook.worksheet_range(&name).map_err(open_err)?;
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());

    records_from_rows(rows, skip_after_header)
        .ok_or_else(|| CatalogError::NoHeader(path.to_path_buf()))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}
