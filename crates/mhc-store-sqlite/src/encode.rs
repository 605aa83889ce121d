//! Translation between [`mhc_core`] tables and SQLite statements.

use mhc_core::{Table, Value};
use rusqlite::types::Value as SqlValue;

/// Quote an identifier, doubling embedded double quotes.
pub fn quote_ident(name: &str) -> String { format!("\"{}\"", name.replace('"', "\"\"")) }

pub fn encode_value(v: &Value) -> SqlValue {
  match v {
    Value::Null => SqlValue::Null,
    Value::Integer(n) => SqlValue::Integer(*n),
    Value::Real(n) => SqlValue::Real(*n),
    Value::Text(s) => SqlValue::Text(s.clone()),
  }
}

/// `CREATE TABLE` for a batch, with column types inferred from its values.
pub fn create_table_sql(table: &Table) -> String {
  let columns: Vec<String> = table
    .columns
    .iter()
    .zip(table.column_types())
    .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.as_sql()))
    .collect();
  format!("CREATE TABLE {} ({})", quote_ident(&table.name), columns.join(", "))
}

pub fn insert_sql(table: &Table) -> String {
  let columns: Vec<String> = table.columns.iter().map(|c| quote_ident(c)).collect();
  let placeholders: Vec<String> = (1..=table.columns.len()).map(|i| format!("?{i}")).collect();
  format!(
    "INSERT INTO {} ({}) VALUES ({})",
    quote_ident(&table.name),
    columns.join(", "),
    placeholders.join(", ")
  )
}
