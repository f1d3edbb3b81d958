//! [`Table`] — creation, seeding, the coalescing upsert, and CSV export.

use std::path::Path;

use lode_core::{
  Error as CoreError,
  reconcile::{reconcile, validate_headers},
  record::Target,
  schema::{ColumnType, TableSchema},
};
use rusqlite::{params_from_iter, types::Value};

use crate::{
  Error, Result,
  sql::{create_query, seed_query, upsert_query},
  store::SqliteStore,
};

/// A write rejection carried out of the database thread by value, so the
/// offending statement and row survive into [`Error::Write`].
struct Rejection {
  row:    String,
  reason: String,
}

/// One parsed incoming row: bound values plus a display form for errors.
struct ParsedRow {
  values:  Vec<Value>,
  display: String,
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// Handle on one physical table. Holds the run's reconciled (standardized)
/// schema; all writes go through either the seed path (insert-or-ignore) or
/// the coalesce path (first non-null wins).
#[derive(Clone, Debug)]
pub struct Table {
  store:  SqliteStore,
  schema: TableSchema,
}

impl Table {
  /// (Re)create the physical table and, when `infile` is given, reconcile
  /// the schema against the file's header row and bulk-load its rows with
  /// insert-or-ignore semantics.
  ///
  /// `url_col` names the URL column of a `links` input file; its value is
  /// copied into the canonical `url` slot at seed time while the original
  /// column survives as an ordinary column.
  ///
  /// Dropping and recreating is only acceptable at process start, never
  /// mid-run — this is the sole place a `DROP` is issued.
  pub async fn create(
    store: &SqliteStore,
    mut schema: TableSchema,
    infile: Option<&Path>,
    url_col: Option<&str>,
  ) -> Result<Self> {
    let headers = match infile {
      Some(path) => {
        let headers = read_headers(path)?;
        validate_headers(&headers, &schema, url_col)?;
        let reconciled = reconcile(&headers, &schema);
        schema.columns = reconciled.standardized;
        Some(headers)
      }
      None => None,
    };

    let drop_stmt = format!("DROP TABLE IF EXISTS {}", schema.name);
    let create_stmt = create_query(&schema);
    store
      .connection()
      .call(move |conn| {
        conn.execute_batch(&format!("{drop_stmt}; {create_stmt};"))?;
        Ok(())
      })
      .await?;

    let table = Self {
      store: store.clone(),
      schema,
    };

    if let (Some(path), Some(headers)) = (infile, headers) {
      table.insert_seed(path, &headers, url_col).await?;
    }

    Ok(table)
  }

  pub fn name(&self) -> &str {
    self.schema.name
  }

  pub fn schema(&self) -> &TableSchema {
    &self.schema
  }

  // ── Seed ──────────────────────────────────────────────────────────────────

  /// Bulk-load the initial dataset with `INSERT OR IGNORE`: the first writer
  /// for a given key wins at seed time, and repeated keys never duplicate.
  async fn insert_seed(
    &self,
    path: &Path,
    headers: &[String],
    url_col: Option<&str>,
  ) -> Result<()> {
    // The canonical `url` slot is filled from the declared URL column when
    // the input names it differently.
    let remap_url = match url_col {
      Some(col) if col != "url" && self.schema.name == lode_core::schema::LINKS_TABLE => {
        Some(headers.iter().position(|h| h == col).ok_or_else(|| {
          Error::Core(CoreError::MissingUrlColumn(col.to_string()))
        })?)
      }
      _ => None,
    };

    let mut columns: Vec<String> = headers.to_vec();
    if remap_url.is_some() && !columns.iter().any(|c| c == "url") {
      columns.push("url".to_string());
    }

    let statement = seed_query(&self.schema, &columns);

    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
      let record = record?;
      let mut parsed = self.parse_row(&statement, headers, &record)?;
      if let Some(idx) = remap_url {
        let url_value = parsed.values[idx].clone();
        match columns.iter().position(|c| c == "url") {
          Some(pos) if pos < headers.len() => parsed.values[pos] = url_value,
          _ => parsed.values.push(url_value),
        }
      }
      self.check_key_values(&statement, &columns, &parsed)?;
      rows.push(parsed);
    }

    self.execute_batch(statement, rows).await
  }

  // ── Coalesce ──────────────────────────────────────────────────────────────

  /// THE key operation: merge a collector's output file into the table.
  ///
  /// Every incoming row is widened to the table's full standardized column
  /// set — columns absent from the file, and empty cells, bind as SQL NULL,
  /// never as an empty string. The insert's conflict arm sets each non-key
  /// column to `COALESCE(existing, excluded)`, so a stored non-null value is
  /// never clobbered and incoming values only fill gaps. The rule is the
  /// same for every collector and for rows within one batch, which makes the
  /// merge commutative and associative per key.
  pub async fn coalesce(&self, path: &Path) -> Result<()> {
    let headers = match read_optional_headers(path)? {
      Some(headers) => headers,
      // Headers-only or empty file: nothing to merge.
      None => return Ok(()),
    };

    // Map each file column onto the standardized set; a column the table
    // does not have is fatal rather than silently dropped.
    let mut positions: Vec<Option<usize>> = Vec::with_capacity(self.schema.columns.len());
    for (name, _) in &self.schema.columns {
      positions.push(headers.iter().position(|h| h == name));
    }
    for header in &headers {
      if !self.schema.columns.iter().any(|(name, _)| name == header) {
        return Err(Error::UnknownColumn {
          table:  self.schema.name.to_string(),
          column: header.clone(),
        });
      }
    }

    let statement = upsert_query(&self.schema);
    let column_names: Vec<String> =
      self.schema.column_names().map(str::to_string).collect();

    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
      let record = record?;
      let mut values = Vec::with_capacity(self.schema.columns.len());
      for ((name, ty), position) in self.schema.columns.iter().zip(&positions) {
        let raw = position.and_then(|i| record.get(i)).unwrap_or("");
        values.push(coerce(&statement, &record, name, *ty, raw)?);
      }
      let parsed = ParsedRow {
        values,
        display: display_record(&record),
      };
      self.check_key_values(&statement, &column_names, &parsed)?;
      rows.push(parsed);
    }

    tracing::debug!(
      table = self.schema.name,
      rows = rows.len(),
      "coalescing batch"
    );
    self.execute_batch(statement, rows).await
  }

  // ── Export ────────────────────────────────────────────────────────────────

  /// Dump the full table, in physical column order, to a CSV file with a
  /// header row. NULL renders as an empty field, so exporting and
  /// re-coalescing the unchanged output is a no-op.
  pub async fn export(&self, path: &Path) -> Result<()> {
    let table = self.schema.name;
    let (headers, rows): (Vec<String>, Vec<Vec<Value>>) = self
      .store
      .connection()
      .call(move |conn| {
        let mut headers = Vec::new();
        let mut stmt =
          conn.prepare(&format!("SELECT name FROM pragma_table_info('{table}')"))?;
        let mut names = stmt.query([])?;
        while let Some(row) = names.next()? {
          headers.push(row.get::<_, String>(0)?);
        }

        let mut stmt = conn.prepare(&format!("SELECT * FROM {table}"))?;
        let column_count = headers.len();
        let rows = stmt
          .query_map([], |row| {
            (0..column_count)
              .map(|i| row.get::<_, Value>(i))
              .collect::<rusqlite::Result<Vec<Value>>>()
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((headers, rows))
      })
      .await?;

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&headers)?;
    for row in rows {
      writer.write_record(row.iter().map(render_value))?;
    }
    writer.flush()?;

    tracing::debug!(table = self.schema.name, path = %path.display(), "exported table");
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Enrichment targets: the distinct primary-key values of the table,
  /// feeding the orchestrator's partitioning step. Under a `(url, link_id)`
  /// key each pair is its own target, so downstream records address the
  /// exact row they enrich.
  pub async fn targets(&self) -> Result<Vec<Target>> {
    let with_link_id = self.schema.is_key("link_id");
    let query = if with_link_id {
      format!("SELECT DISTINCT url, link_id FROM {}", self.schema.name)
    } else {
      format!("SELECT DISTINCT url FROM {}", self.schema.name)
    };
    let targets = self
      .store
      .connection()
      .call(move |conn| {
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Target {
              url:     row.get::<_, String>(0)?,
              link_id: if with_link_id { row.get(1)? } else { None },
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(targets)
  }

  /// Number of rows currently in the table.
  pub async fn row_count(&self) -> Result<i64> {
    let query = format!("SELECT COUNT(*) FROM {}", self.schema.name);
    let count = self
      .store
      .connection()
      .call(move |conn| Ok(conn.query_row(&query, [], |row| row.get(0))?))
      .await?;
    Ok(count)
  }

  /// Value of `column` for the row identified by the key pairs, rendered as
  /// text; `None` for NULL. Used by diagnostics and tests.
  pub async fn select_value(
    &self,
    key: &[(&str, &str)],
    column: &str,
  ) -> Result<Option<String>> {
    let conditions = key
      .iter()
      .map(|(col, _)| format!("{col} = ?"))
      .collect::<Vec<_>>()
      .join(" AND ");
    let query = format!(
      "SELECT {column} FROM {} WHERE {conditions}",
      self.schema.name
    );
    let params: Vec<String> = key.iter().map(|(_, v)| v.to_string()).collect();

    let value = self
      .store
      .connection()
      .call(move |conn| {
        Ok(conn.query_row(&query, params_from_iter(params.iter()), |row| {
          row.get::<_, Value>(0)
        })?)
      })
      .await?;

    Ok(match value {
      Value::Null => None,
      other => Some(render_value(&other)),
    })
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  fn parse_row(
    &self,
    statement: &str,
    headers: &[String],
    record: &csv::StringRecord,
  ) -> Result<ParsedRow> {
    let mut values = Vec::with_capacity(headers.len());
    for (i, header) in headers.iter().enumerate() {
      let ty = self.schema.column_type(header).unwrap_or(ColumnType::Text);
      let raw = record.get(i).unwrap_or("");
      values.push(coerce(statement, record, header, ty, raw)?);
    }
    Ok(ParsedRow {
      values,
      display: display_record(record),
    })
  }

  /// Reject a row whose primary-key column binds as NULL. SQLite never
  /// treats NULL key components as conflicting, so such a row would slip
  /// past the upsert's conflict arm and duplicate on every merge.
  fn check_key_values(
    &self,
    statement: &str,
    columns: &[String],
    row: &ParsedRow,
  ) -> Result<()> {
    for key in &self.schema.primary_key {
      let null = match columns.iter().position(|c| c == key) {
        Some(i) => matches!(row.values[i], Value::Null),
        None => true,
      };
      if null {
        return Err(Error::Write {
          statement: statement.to_string(),
          row:       row.display.clone(),
          reason:    format!("primary key column {key:?} is NULL"),
        });
      }
    }
    Ok(())
  }

  /// Run one prepared statement over all rows inside a single transaction.
  /// A rejected row aborts and rolls back the batch; nothing is silently
  /// skipped.
  async fn execute_batch(&self, statement: String, rows: Vec<ParsedRow>) -> Result<()> {
    if rows.is_empty() {
      return Ok(());
    }

    let stmt_for_error = statement.clone();
    let rejection: Option<Rejection> = self
      .store
      .connection()
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(&statement)?;
          for row in &rows {
            if let Err(err) = stmt.execute(params_from_iter(row.values.iter())) {
              return Ok(Some(Rejection {
                row:    row.display.clone(),
                reason: err.to_string(),
              }));
            }
          }
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    match rejection {
      Some(rejection) => Err(Error::Write {
        statement: stmt_for_error,
        row:       rejection.row,
        reason:    rejection.reason,
      }),
      None => Ok(()),
    }
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Header row of `path`; empty or missing headers are a validation error.
fn read_headers(path: &Path) -> Result<Vec<String>> {
  match read_optional_headers(path)? {
    Some(headers) => Ok(headers),
    None => Err(Error::Core(CoreError::NoHeaders)),
  }
}

/// Header row of `path`, or `None` when the file has none.
fn read_optional_headers(path: &Path) -> Result<Option<Vec<String>>> {
  let mut reader = csv::Reader::from_path(path)?;
  let headers = reader.headers()?;
  if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
    return Ok(None);
  }
  Ok(Some(headers.iter().map(str::to_string).collect()))
}

/// Bind one cell. Empty cells are SQL NULL, never the empty string; a
/// non-integer value for a declared INTEGER column is a fatal write error.
fn coerce(
  statement: &str,
  record: &csv::StringRecord,
  column: &str,
  ty: ColumnType,
  raw: &str,
) -> Result<Value> {
  if raw.is_empty() {
    return Ok(Value::Null);
  }
  match ty {
    ColumnType::Text => Ok(Value::Text(raw.to_string())),
    ColumnType::Integer => raw.trim().parse::<i64>().map(Value::Integer).map_err(|_| {
      Error::Write {
        statement: statement.to_string(),
        row:       display_record(record),
        reason:    format!("value {raw:?} is not coercible to INTEGER column {column:?}"),
      }
    }),
  }
}

fn display_record(record: &csv::StringRecord) -> String {
  record.iter().collect::<Vec<_>>().join(",")
}

fn render_value(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::Integer(i) => i.to_string(),
    Value::Real(f) => f.to_string(),
    Value::Text(s) => s.clone(),
    Value::Blob(_) => String::new(),
  }
}
