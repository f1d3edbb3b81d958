//! Column reconciliation between an input file's header row and a table's
//! canonical schema.
//!
//! Input datasets may carry a subset or superset of the canonical columns,
//! and may name their URL column arbitrarily. Reconciliation produces the
//! unified ("standardized") column list used to create the physical table:
//! input columns first, in input order, then any canonical column not
//! already present. File IO stays in the store crate; everything here is
//! pure logic over an already-read header row.

use crate::{
  Error, Result,
  schema::{ColumnType, LINKS_TABLE, TableSchema},
};

/// Outcome of reconciling one input file against one table schema.
#[derive(Debug, Clone)]
pub struct ReconciledColumns {
  /// Header row of the input file, as-is.
  pub original:     Vec<String>,
  /// `original` plus appended canonical columns, no duplicates.
  pub standardized: Vec<(String, ColumnType)>,
}

impl ReconciledColumns {
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.standardized.iter().map(|(name, _)| name.as_str())
  }
}

/// Check that `headers` can seed `schema`'s table.
///
/// - [`Error::NoHeaders`] when the header row is empty;
/// - [`Error::MissingUrlColumn`] for `links` when the declared URL column is
///   not among the headers;
/// - [`Error::MissingPrimaryKeyColumn`] when any other primary-key column is
///   missing — `link_id` for a `(url, link_id)`-keyed links table, both key
///   columns for `shared_content`.
pub fn validate_headers(
  headers: &[String],
  schema: &TableSchema,
  url_col: Option<&str>,
) -> Result<()> {
  if headers.is_empty() {
    return Err(Error::NoHeaders);
  }

  if schema.name == LINKS_TABLE {
    let url_col = url_col.unwrap_or("url");
    if !headers.iter().any(|h| h == url_col) {
      return Err(Error::MissingUrlColumn(url_col.to_string()));
    }
    // The URL key is satisfied through the declared column; any further key
    // component must be a header of its own.
    for key in &schema.primary_key {
      if key != "url" && !headers.iter().any(|h| h == key) {
        return Err(Error::MissingPrimaryKeyColumn(key.clone()));
      }
    }
  } else {
    for key in &schema.primary_key {
      if !headers.iter().any(|h| h == key) {
        return Err(Error::MissingPrimaryKeyColumn(key.clone()));
      }
    }
  }

  Ok(())
}

/// Fold canonical columns into the input's header row.
///
/// Every standardized column gets the canonical type where one is declared,
/// else TEXT.
pub fn reconcile(headers: &[String], schema: &TableSchema) -> ReconciledColumns {
  let mut standardized: Vec<(String, ColumnType)> = headers
    .iter()
    .map(|h| (h.clone(), schema.column_type(h).unwrap_or(ColumnType::Text)))
    .collect();

  for (name, ty) in &schema.columns {
    if !headers.iter().any(|h| h == name) {
      standardized.push((name.clone(), *ty));
    }
  }

  ReconciledColumns {
    original: headers.to_vec(),
    standardized,
  }
}
