//! Error type for `mhc-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  /// A table batch arrived without any columns to create.
  #[error("table {0} has no columns")]
  NoColumns(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
