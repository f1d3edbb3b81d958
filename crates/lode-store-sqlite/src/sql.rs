//! SQL statement rendering for table creation and the coalescing upsert.

use lode_core::schema::TableSchema;

/// `CREATE TABLE IF NOT EXISTS name(col TYPE, …, PRIMARY KEY (pk, …))`.
pub fn create_query(schema: &TableSchema) -> String {
  let cols = schema
    .columns
    .iter()
    .map(|(name, ty)| format!("{name} {}", ty.as_sql()))
    .collect::<Vec<_>>()
    .join(", ");
  format!(
    "CREATE TABLE IF NOT EXISTS {}({cols}, PRIMARY KEY ({}))",
    schema.name,
    schema.primary_key.join(",")
  )
}

/// The `DO UPDATE SET` arm of the coalescing upsert, covering every non-key
/// column: `c = COALESCE(c, excluded.c)`.
///
/// The unqualified column refers to the stored row, `excluded.c` to the
/// incoming one — a stored non-null value is never clobbered, incoming
/// values only fill gaps. Key columns are never touched by the update arm.
pub fn coalesce_assignments(schema: &TableSchema) -> String {
  schema
    .columns
    .iter()
    .filter(|(name, _)| !schema.is_key(name))
    .map(|(name, _)| format!("{name}=COALESCE({name}, excluded.{name})"))
    .collect::<Vec<_>>()
    .join(", ")
}

/// Full upsert statement over the table's standardized column set.
pub fn upsert_query(schema: &TableSchema) -> String {
  let cols: Vec<&str> = schema.column_names().collect();
  let placeholders = vec!["?"; cols.len()].join(", ");
  let assignments = coalesce_assignments(schema);

  let conflict_arm = if assignments.is_empty() {
    "DO NOTHING".to_string()
  } else {
    format!("DO UPDATE SET {assignments}")
  };

  format!(
    "INSERT INTO {}({}) VALUES ({placeholders}) ON CONFLICT ({}) {conflict_arm}",
    schema.name,
    cols.join(", "),
    schema.primary_key.join(",")
  )
}

/// Seed insert over an explicit column subset: first writer for a key wins.
pub fn seed_query(schema: &TableSchema, columns: &[String]) -> String {
  let placeholders = vec!["?"; columns.len()].join(", ");
  format!(
    "INSERT OR IGNORE INTO {}({}) VALUES ({placeholders})",
    schema.name,
    columns.join(", ")
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use lode_core::schema::{ColumnType, TableSchema};

  fn small_schema() -> TableSchema {
    TableSchema {
      name:        "links",
      primary_key: vec!["url".to_string()],
      columns:     vec![
        ("url".to_string(), ColumnType::Text),
        ("domain".to_string(), ColumnType::Text),
        ("work_type".to_string(), ColumnType::Text),
      ],
    }
  }

  #[test]
  fn create_query_renders_types_and_key() {
    assert_eq!(
      create_query(&small_schema()),
      "CREATE TABLE IF NOT EXISTS links(url TEXT, domain TEXT, work_type TEXT, \
       PRIMARY KEY (url))"
    );
  }

  #[test]
  fn coalesce_assignments_skip_key_columns() {
    assert_eq!(
      coalesce_assignments(&small_schema()),
      "domain=COALESCE(domain, excluded.domain), \
       work_type=COALESCE(work_type, excluded.work_type)"
    );
  }

  #[test]
  fn upsert_query_targets_composite_key() {
    let schema = TableSchema::shared_content();
    let sql = upsert_query(&schema);
    assert!(sql.contains("ON CONFLICT (post_url,content_url)"));
    assert!(sql.contains("media_type=COALESCE(media_type, excluded.media_type)"));
    assert!(!sql.contains("post_url=COALESCE"));
    assert!(!sql.contains("content_url=COALESCE"));
  }
}
