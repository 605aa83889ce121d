//! [`SqliteStore`] and its transactional [`Session`]: the SQLite
//! implementation of [`Sink`].

use std::path::Path;

use mhc_core::{Sink, Table};
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
  Error, Result,
  encode::{create_table_sql, encode_value, insert_sql, quote_ident},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The database file a run loads into.
///
/// Holds one exclusive connection. All writes go through a [`Session`]
/// obtained from [`SqliteStore::begin`].
pub struct SqliteStore {
  conn: Connection,
}

impl SqliteStore {
  /// Open (or create) the database at `path`.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = Connection::open(path)?;
    tracing::info!("connected to database: {}", path.display());
    Ok(Self { conn })
  }

  /// Open an in-memory database.
  pub fn open_in_memory() -> Result<Self> {
    Ok(Self { conn: Connection::open_in_memory()? })
  }

  /// Start the run's transaction.
  ///
  /// The session takes the write lock immediately. Dropping it without
  /// calling [`Sink::commit`] rolls every write back.
  pub fn begin(&mut self) -> Result<Session<'_>> {
    let tx = self
      .conn
      .transaction_with_behavior(TransactionBehavior::Immediate)?;
    Ok(Session { tx })
  }

  /// Names of all user tables, sorted.
  pub fn table_names(&self) -> Result<Vec<String>> {
    let mut stmt = self.conn.prepare(
      "SELECT name FROM sqlite_master
       WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
       ORDER BY name",
    )?;
    let names = stmt
      .query_map([], |row| row.get(0))?
      .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
  }

  pub fn row_count(&self, table: &str) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(n as usize)
  }

  /// Column names of `table` in declaration order.
  pub fn column_names(&self, table: &str) -> Result<Vec<String>> {
    let sql = format!("SELECT * FROM {} LIMIT 0", quote_ident(table));
    let stmt = self.conn.prepare(&sql)?;
    Ok(stmt.column_names().into_iter().map(str::to_owned).collect())
  }

  /// Borrow the raw connection for ad-hoc reads.
  pub fn connection(&self) -> &Connection { &self.conn }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// One all-or-nothing load into a [`SqliteStore`].
pub struct Session<'c> {
  tx: Transaction<'c>,
}

impl Sink for Session<'_> {
  type Error = Error;

  fn execute_script(&mut self, script: &str) -> Result<()> {
    self.tx.execute_batch(script)?;
    Ok(())
  }

  fn replace_table(&mut self, table: &Table) -> Result<usize> {
    if table.columns.is_empty() {
      return Err(Error::NoColumns(table.name.clone()));
    }

    self
      .tx
      .execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(&table.name)), [])?;
    self.tx.execute(&create_table_sql(table), [])?;

    let mut stmt = self.tx.prepare(&insert_sql(table))?;
    for row in &table.rows {
      stmt.execute(rusqlite::params_from_iter(row.iter().map(encode_value)))?;
    }

    tracing::debug!("replaced {} with {} rows", table.name, table.rows.len());
    Ok(table.rows.len())
  }

  fn clear_table(&mut self, name: &str) -> Result<usize> {
    let exists: bool = self.tx.query_row(
      "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
      [name],
      |row| row.get(0),
    )?;
    if !exists {
      return Ok(0);
    }
    let removed = self.tx.execute(&format!("DELETE FROM {}", quote_ident(name)), [])?;
    tracing::debug!("cleared {removed} rows from {name}");
    Ok(removed)
  }

  fn commit(self) -> Result<()> {
    self.tx.commit()?;
    Ok(())
  }

  fn rollback(self) -> Result<()> {
    self.tx.rollback()?;
    Ok(())
  }
}
