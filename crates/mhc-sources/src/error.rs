//! Error types for `mhc-sources`.
//!
//! Anything surfaced as an [`Error`] aborts the whole run. Recoverable
//! conditions (a missing optional file, an unresolvable column) are reported
//! as [`Extraction::Skipped`](crate::Extraction::Skipped) instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] mhc_core::Error),

  #[error("csv error in {file}: {source}")]
  Csv {
    file:   String,
    #[source]
    source: csv::Error,
  },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A source the run cannot proceed without is absent.
  #[error("required source file not found: {}", .0.display())]
  MissingSource(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
