//! Cell and table model handed from extractors to a [`Sink`](crate::Sink).
//!
//! A [`Table`] is a named batch of rows with a fixed column list. It carries
//! no schema beyond the column names; a sink infers column types from the
//! values with [`Table::column_types`].

use serde::Serialize;

use crate::{Error, Result};

// ─── Value ───────────────────────────────────────────────────────────────────

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl Value {
  /// Numeric cell; whole numbers are stored as integers.
  pub fn number(n: Option<f64>) -> Self {
    match n {
      Some(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
        Value::Integer(n as i64)
      }
      Some(n) if n.is_finite() => Value::Real(n),
      _ => Value::Null,
    }
  }

  pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

  /// The cell's text, if it holds text. Numbers are not text.
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Value::Text(s) => Some(s),
      _ => None,
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self { Value::Text(s.to_owned()) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Value::Text(s) }
}

impl From<i64> for Value {
  fn from(n: i64) -> Self { Value::Integer(n) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Value::Null, Into::into) }
}

// ─── SqlType ─────────────────────────────────────────────────────────────────

/// Storage class chosen for a column when a table is recreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
  Integer,
  Real,
  Text,
}

impl SqlType {
  pub fn as_sql(self) -> &'static str {
    match self {
      SqlType::Integer => "INTEGER",
      SqlType::Real => "REAL",
      SqlType::Text => "TEXT",
    }
  }
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// A named batch of rows destined for one target table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
  pub name:    String,
  pub columns: Vec<String>,
  pub rows:    Vec<Vec<Value>>,
}

impl Table {
  pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      name:    name.into(),
      columns: columns.into_iter().map(Into::into).collect(),
      rows:    Vec::new(),
    }
  }

  /// Append a row; its width must match the column list.
  pub fn push(&mut self, row: Vec<Value>) -> Result<()> {
    if row.len() != self.columns.len() {
      return Err(Error::RowShape {
        table:    self.name.clone(),
        expected: self.columns.len(),
        got:      row.len(),
      });
    }
    self.rows.push(row);
    Ok(())
  }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn column_index(&self, column: &str) -> Option<usize> {
    self.columns.iter().position(|c| c == column)
  }

  /// Iterate one column's cells.
  pub fn column<'t>(&'t self, column: &str) -> impl Iterator<Item = &'t Value> + use<'t> {
    let idx = self.column_index(column);
    self.rows.iter().filter_map(move |row| idx.map(|i| &row[i]))
  }

  /// Infer a storage class per column from its non-null cells.
  ///
  /// Any text makes the column `TEXT`; otherwise any real makes it `REAL`;
  /// otherwise integers give `INTEGER`. An all-null column is `TEXT`.
  pub fn column_types(&self) -> Vec<SqlType> {
    (0..self.columns.len())
      .map(|i| {
        let (mut int, mut real) = (false, false);
        for row in &self.rows {
          match &row[i] {
            Value::Text(_) => return SqlType::Text,
            Value::Real(_) => real = true,
            Value::Integer(_) => int = true,
            Value::Null => {}
          }
        }
        match (real, int) {
          (true, _) => SqlType::Real,
          (false, true) => SqlType::Integer,
          (false, false) => SqlType::Text,
        }
      })
      .collect()
  }
}
