//! [`SqliteStore`] — connection lifecycle for one enrichment run.

use std::path::Path;

use lode_core::schema::TableSchema;

use crate::{Result, table::Table};

/// The shared relational store: a single SQLite connection, in-memory or
/// file-backed, reused sequentially by every component within a run.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for SqliteStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SqliteStore").finish_non_exhaustive()
  }
}

impl SqliteStore {
  /// Open (or create) a file-backed store at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Ok(Self { conn })
  }

  /// Open an in-memory store — the default for one-shot runs and tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Ok(Self { conn })
  }

  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection {
    &self.conn
  }

  /// Create a table from `schema`, optionally reconciled against and seeded
  /// from `infile`. See [`Table::create`].
  pub async fn table(
    &self,
    schema: TableSchema,
    infile: Option<&Path>,
    url_col: Option<&str>,
  ) -> Result<Table> {
    Table::create(self, schema, infile, url_col).await
  }
}
