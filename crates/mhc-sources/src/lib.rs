//! Per-source extractors for the MHC program exports.
//!
//! Each extractor reads one fixed file (or file group) from the data
//! directory, resolves its columns by keyword, derives participant keys and
//! returns the normalized [`Table`]s. Writing them is the orchestrator's job.
//!
//! ```no_run
//! use std::path::Path;
//! use mhc_sources::{Extraction, extractors};
//!
//! for extractor in extractors() {
//!   match extractor.extract(Path::new(".")).unwrap() {
//!     Extraction::Tables(tables) => println!("{}: {} tables", extractor.stage(), tables.len()),
//!     Extraction::Skipped(why) => println!("{}: skipped ({why})", extractor.stage()),
//!   }
//! }
//! ```

use std::path::Path;

use mhc_core::{ColumnRule, Matcher, Table};

pub mod charges;
pub mod diagnosis_codes;
pub mod error;
pub mod frame;
pub mod jail;
pub mod mental_health;
pub mod psychosocial;
pub mod risk;
pub mod roster;
pub mod treatment;

pub use error::{Error, Result};
pub use frame::{Frame, Row};

// ─── Extractor ───────────────────────────────────────────────────────────────

/// What an extractor produced.
#[derive(Debug)]
pub enum Extraction {
  /// Tables to replace, in write order.
  Tables(Vec<Table>),
  /// The source could not be used; nothing should be written.
  Skipped(String),
}

impl Extraction {
  pub fn skipped(reason: impl Into<String>) -> Self { Extraction::Skipped(reason.into()) }
}

/// One source file (or file group) and the tables derived from it.
pub trait Extractor {
  /// Label used in progress output, e.g. `"PARTICIPANT and MHC_ENROLLMENT"`.
  fn stage(&self) -> &'static str;

  /// Every table this source owns. Any of them not written by a run is
  /// emptied, so the store never mixes runs.
  fn tables(&self) -> &'static [&'static str];

  /// Read the source from `data_dir`.
  ///
  /// An `Err` is fatal for the run; anything recoverable comes back as
  /// [`Extraction::Skipped`].
  fn extract(&self, data_dir: &Path) -> Result<Extraction>;
}

/// All extractors in load order: reference tables and participants first.
pub fn extractors() -> Vec<Box<dyn Extractor>> {
  vec![
    Box::new(diagnosis_codes::DiagnosisCodes),
    Box::new(roster::Participants),
    Box::new(charges::CriminalCharges),
    Box::new(mental_health::MentalHealth),
    Box::new(risk::RiskAssessments),
    Box::new(jail::JailData),
    Box::new(treatment::TreatmentEpisodes::default()),
    Box::new(psychosocial::PsychosocialAssessments),
  ]
}

// ─── Shared rules ────────────────────────────────────────────────────────────

/// Participant name column for sources keyed by `NAME` / `PARTICIPANT`.
pub(crate) const PARTICIPANT_NAME: ColumnRule = ColumnRule::new(
  "participant name",
  &[
    Matcher::Exact(&["PARTICIPANT NAME", "NAME"]),
    Matcher::Contains(&["NAME"]),
    Matcher::Contains(&["PARTICIPANT"]),
  ],
);

/// As [`PARTICIPANT_NAME`], also accepting vendor `CLIENT` columns.
pub(crate) const CLIENT_NAME: ColumnRule = ColumnRule::new(
  "participant name",
  &[
    Matcher::Exact(&["PARTICIPANT NAME", "CLIENT NAME", "NAME"]),
    Matcher::Contains(&["NAME"]),
    Matcher::Contains(&["PARTICIPANT", "CLIENT"]),
  ],
);

/// Skip a source whose key column could not be found.
pub(crate) fn missing_column(frame: &Frame, rule: &ColumnRule) -> Extraction {
  tracing::error!(
    "{}: could not find {} column; available columns: {:?}",
    frame.name(),
    rule.label,
    frame.headers()
  );
  Extraction::skipped(format!("{}: no {} column", frame.name(), rule.label))
}

/// Skip an absent optional file.
pub(crate) fn missing_file(file: &str) -> Extraction {
  Extraction::skipped(format!("{file} not found"))
}

#[cfg(test)]
pub(crate) mod test_util {
  use crate::Frame;

  pub fn frame(name: &str, csv: &str) -> Frame {
    Frame::from_reader(name, csv.as_bytes(), true).expect("valid csv")
  }

  /// One column of a table as optional strings, for terse assertions.
  pub fn texts(table: &mhc_core::Table, column: &str) -> Vec<Option<String>> {
    table
      .column(column)
      .map(|v| match v {
        mhc_core::Value::Null => None,
        mhc_core::Value::Text(s) => Some(s.clone()),
        mhc_core::Value::Integer(n) => Some(n.to_string()),
        mhc_core::Value::Real(n) => Some(n.to_string()),
      })
      .collect()
  }
}
