//! Error types for `lode-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The input CSV file yielded no header row.
  #[error("no headers detected in input file")]
  NoHeaders,

  /// The declared URL column is absent from the `links` input file.
  #[error("declared URL column {0:?} is not a header in the input file")]
  MissingUrlColumn(String),

  /// A primary-key column is absent from the `shared_content` input file.
  #[error("required primary key column {0:?} is not a header in the input file")]
  MissingPrimaryKeyColumn(String),

  /// A source was requested but its credentials are not configured.
  #[error("no credentials configured for source {0:?}")]
  MissingCredential(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
