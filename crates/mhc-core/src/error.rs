//! Error types for `mhc-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A column needed to form a row key could not be resolved.
  #[error("{source_name}: required column {column:?} not found")]
  MissingColumn {
    source_name: String,
    column:      String,
  },

  #[error("row has {got} values but table {table} has {expected} columns")]
  RowShape {
    table:    String,
    expected: usize,
    got:      usize,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
