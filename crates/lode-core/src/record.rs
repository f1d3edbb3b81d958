//! Flat enrichment records and collection targets.

// ─── Targets ─────────────────────────────────────────────────────────────────

/// One URL to enrich, optionally paired with a caller-supplied link
/// identifier (used when the `links` table is keyed by `(url, link_id)`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
  pub url:     String,
  pub link_id: Option<String>,
}

impl Target {
  pub fn new(url: impl Into<String>) -> Self {
    Self {
      url:     url.into(),
      link_id: None,
    }
  }
}

// ─── Flat records ────────────────────────────────────────────────────────────

/// One partial enrichment result: an ordered column → optional-value map.
///
/// Collectors populate whatever subset of canonical columns they can; unset
/// columns and empty values both reach the store as SQL NULL, so a record
/// carrying only its key columns coalesces to a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRecord {
  fields: Vec<(String, Option<String>)>,
}

impl FlatRecord {
  /// Record carrying only the target's key column(s).
  pub fn for_target(target: &Target) -> Self {
    let mut record = Self::default();
    record.set("url", Some(target.url.clone()));
    if let Some(id) = &target.link_id {
      record.set("link_id", Some(id.clone()));
    }
    record
  }

  /// Set `column` to `value`, replacing any earlier value for the column.
  /// Empty strings are normalised to `None`.
  pub fn set(&mut self, column: impl Into<String>, value: Option<String>) {
    let column = column.into();
    let value = value.filter(|v| !v.is_empty());
    match self.fields.iter_mut().find(|(name, _)| *name == column) {
      Some((_, slot)) => *slot = value,
      None => self.fields.push((column, value)),
    }
  }

  /// Convenience for integer-valued counter columns.
  pub fn set_count(&mut self, column: impl Into<String>, value: Option<i64>) {
    self.set(column, value.map(|v| v.to_string()));
  }

  pub fn get(&self, column: &str) -> Option<&str> {
    self
      .fields
      .iter()
      .find(|(name, _)| name == column)
      .and_then(|(_, value)| value.as_deref())
  }

  /// Columns set on this record, in insertion order.
  pub fn columns(&self) -> impl Iterator<Item = &str> {
    self.fields.iter().map(|(name, _)| name.as_str())
  }

  /// Whether anything beyond the given key columns is populated.
  pub fn is_key_only(&self, keys: &[String]) -> bool {
    self
      .fields
      .iter()
      .all(|(name, value)| value.is_none() || keys.iter().any(|k| k == name))
  }
}
