//! The [`Sink`] trait: the only way extracted rows reach storage.
//!
//! A sink is one transaction. Every [`Table`] handed to
//! [`Sink::replace_table`] discards the target's previous contents, and
//! [`Sink::clear_table`] empties a table whose source produced nothing.
//! Nothing becomes visible until [`Sink::commit`].

use std::{io, path::Path};

use serde::Serialize;

use crate::table::Table;

/// Result of applying the DDL script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SchemaStatus {
  Applied,
  /// The script file does not exist; the existing schema is used as-is.
  Missing,
  /// The script could not be read or executed.
  Failed(String),
}

/// Transactional destination for normalized tables.
pub trait Sink {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Run a multi-statement SQL script.
  fn execute_script(&mut self, script: &str) -> Result<(), Self::Error>;

  /// Drop and recreate `table.name` from the batch's shape, then insert its
  /// rows. Returns the number of rows written.
  fn replace_table(&mut self, table: &Table) -> Result<usize, Self::Error>;

  /// Delete every row of `name`, keeping its definition. A table that does
  /// not exist is left absent. Returns the number of rows removed.
  fn clear_table(&mut self, name: &str) -> Result<usize, Self::Error>;

  fn commit(self) -> Result<(), Self::Error>
  where
    Self: Sized;

  fn rollback(self) -> Result<(), Self::Error>
  where
    Self: Sized;

  /// Read and execute the DDL at `path`.
  ///
  /// Never fails the run: a missing file or a script error is reported in the
  /// returned status and logged.
  fn init_schema(&mut self, path: &Path) -> SchemaStatus {
    let script = match std::fs::read_to_string(path) {
      Ok(s) => s,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        tracing::error!("schema DDL file {} not found", path.display());
        return SchemaStatus::Missing;
      }
      Err(e) => {
        tracing::warn!("could not read schema {}: {e}", path.display());
        return SchemaStatus::Failed(e.to_string());
      }
    };

    match self.execute_script(&without_transaction_control(&script)) {
      Ok(()) => {
        tracing::info!("schema created from {}", path.display());
        SchemaStatus::Applied
      }
      Err(e) => {
        tracing::warn!("note creating schema: {e}");
        SchemaStatus::Failed(e.to_string())
      }
    }
  }
}

/// Statements that would open or close a transaction inside the session's
/// own, matched on whole lines.
const TRANSACTION_CONTROL: &[&str] = &[
  "BEGIN",
  "BEGIN TRANSACTION",
  "BEGIN DEFERRED",
  "BEGIN DEFERRED TRANSACTION",
  "BEGIN IMMEDIATE",
  "BEGIN IMMEDIATE TRANSACTION",
  "BEGIN EXCLUSIVE",
  "BEGIN EXCLUSIVE TRANSACTION",
  "COMMIT",
  "COMMIT TRANSACTION",
  "END TRANSACTION",
];

/// Drop `BEGIN TRANSACTION;` / `COMMIT;` lines from an exported DDL script.
///
/// Trigger bodies (`BEGIN` without a semicolon, bare `END;`) are kept.
fn without_transaction_control(script: &str) -> String {
  script
    .lines()
    .filter(|line| {
      let Some(body) = line.trim().strip_suffix(';') else { return true };
      let statement = body.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
      let control = TRANSACTION_CONTROL.contains(&statement.as_str());
      if control {
        tracing::debug!("ignoring {statement} in schema script");
      }
      !control
    })
    .collect::<Vec<_>>()
    .join("\n")
}
