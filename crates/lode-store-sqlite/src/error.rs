//! Error type for `lode-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] lode_core::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// An incoming file carries a column the table does not have. Surfaced as
  /// fatal rather than silently dropping the column's data.
  #[error("column {column:?} in incoming file does not exist in table {table:?}")]
  UnknownColumn { table: String, column: String },

  /// A statement failed or a row value could not be coerced to its declared
  /// column type. Carries the offending statement and row for diagnosis.
  #[error("write failed: {reason}\n  statement: {statement}\n  row: {row}")]
  Write {
    statement: String,
    row:       String,
    reason:    String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
