//! In-memory view of one CSV export.
//!
//! Headers are trimmed and made unique; cells are trimmed and the usual
//! spreadsheet missing-value tokens read as absent.

use std::{
  collections::{HashMap, HashSet},
  fs::File,
  io::{self, Read},
  path::Path,
};

use csv::{ReaderBuilder, StringRecord, Trim};
use mhc_core::ColumnRule;

use crate::{Error, Result};

/// Cell contents treated the same as an empty cell.
const MISSING_TOKENS: &[&str] = &[
  "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "#N/A", "<NA>",
];

/// A parsed CSV file: header list plus raw records.
pub struct Frame {
  name:    String,
  headers: Vec<String>,
  records: Vec<StringRecord>,
}

impl Frame {
  /// Read a CSV whose first line is the header row.
  ///
  /// Returns `Ok(None)` when the file does not exist.
  pub fn open(path: &Path) -> Result<Option<Self>> { Self::open_with(path, true) }

  /// Read a CSV without a header row. Columns are named by position
  /// (`"0"`, `"1"`, …) and every line is a record.
  pub fn open_headerless(path: &Path) -> Result<Option<Self>> { Self::open_with(path, false) }

  fn open_with(path: &Path, has_headers: bool) -> Result<Option<Self>> {
    let file = match File::open(path) {
      Ok(f) => f,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e.into()),
    };
    let name = path
      .file_name()
      .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Self::from_reader(name, file, has_headers).map(Some)
  }

  /// Parse CSV text from any reader; `name` labels diagnostics.
  pub fn from_reader(name: impl Into<String>, reader: impl Read, has_headers: bool) -> Result<Self> {
    let name = name.into();
    let csv_err = |source: csv::Error| Error::Csv { file: name.clone(), source };

    let mut rdr = ReaderBuilder::new()
      .has_headers(has_headers)
      .flexible(true)
      .trim(Trim::All)
      .from_reader(reader);

    let records = rdr
      .records()
      .collect::<std::result::Result<Vec<_>, _>>()
      .map_err(csv_err)?;

    let headers = if has_headers {
      unique_headers(rdr.headers().map_err(csv_err)?.iter())
    } else {
      let width = records.iter().map(StringRecord::len).max().unwrap_or(0);
      (0..width).map(|i| i.to_string()).collect()
    };

    tracing::debug!("{name}: columns {headers:?}");
    Ok(Self { name, headers, records })
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn headers(&self) -> &[String] { &self.headers }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  /// Index of a header by exact (trimmed) name.
  pub fn position(&self, header: &str) -> Option<usize> {
    self.headers.iter().position(|h| h == header)
  }

  /// Resolve a column rule to a column index.
  pub fn resolve(&self, rule: &ColumnRule) -> Option<usize> { self.resolve_excluding(rule, &[]) }

  /// Resolve a column rule, skipping columns another rule already claimed.
  pub fn resolve_excluding(&self, rule: &ColumnRule, taken: &[Option<usize>]) -> Option<usize> {
    let taken: Vec<&str> = taken
      .iter()
      .flatten()
      .map(|&i| self.headers[i].as_str())
      .collect();
    let header = rule.resolve_excluding(self.headers.as_slice(), &taken).found();
    match header {
      Some(h) => tracing::debug!("{}: using {h:?} as {} column", self.name, rule.label),
      None => tracing::debug!("{}: no {} column", self.name, rule.label),
    }
    header.and_then(|h| self.position(h))
  }

  pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
    self.records.iter().map(|record| Row { record })
  }
}

/// Trim headers (and a byte-order mark), name blank ones `Unnamed: <i>` and
/// suffix repeats with `.1`, `.2`, … in order. A suffix that collides with
/// a header already emitted is skipped.
fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
  let mut emitted: HashSet<String> = HashSet::new();
  let mut next_suffix: HashMap<String, usize> = HashMap::new();
  raw
    .enumerate()
    .map(|(i, h)| {
      let h = match h.trim_start_matches('\u{feff}').trim() {
        "" => format!("Unnamed: {i}"),
        h => h.to_owned(),
      };
      let out = if emitted.contains(&h) {
        let n = next_suffix.entry(h.clone()).or_insert(1);
        while emitted.contains(&format!("{h}.{n}")) {
          *n += 1;
        }
        let suffixed = format!("{h}.{n}");
        *n += 1;
        suffixed
      } else {
        h
      };
      emitted.insert(out.clone());
      out
    })
    .collect()
}

/// One record of a [`Frame`].
#[derive(Clone, Copy)]
pub struct Row<'f> {
  record: &'f StringRecord,
}

impl<'f> Row<'f> {
  /// Cell at a position; absent for short rows and missing-value tokens.
  pub fn at(&self, idx: usize) -> Option<&'f str> {
    self
      .record
      .get(idx)
      .map(str::trim)
      .filter(|cell| !MISSING_TOKENS.contains(cell))
  }

  /// Cell of an optionally-resolved column.
  pub fn get(&self, col: Option<usize>) -> Option<&'f str> { col.and_then(|i| self.at(i)) }
}
