//! Load orchestration for the MHC project database.
//!
//! [`run`] applies the schema, drives every extractor in order through one
//! [`Sink`] and then commits or rolls back as a whole. The binary in
//! `main.rs` wires this to a [`SqliteStore`](mhc_store_sqlite::SqliteStore)
//! and layered configuration.

use std::path::{Path, PathBuf};

use mhc_core::{Outcome, SchemaStatus, Sink};
use mhc_sources::{Extraction, Extractor};
use serde::{Deserialize, Serialize};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from the layered config sources.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoaderConfig {
  /// Directory holding the CSV exports.
  pub data_dir:    PathBuf,
  /// SQLite database to load into; created if absent.
  pub database:    PathBuf,
  pub schema_file: PathBuf,
}

impl Default for LoaderConfig {
  fn default() -> Self {
    Self {
      data_dir:    PathBuf::from("."),
      database:    PathBuf::from("MHC_Project.db"),
      schema_file: PathBuf::from("MHC_Schema_DDL.sql"),
    }
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Outcome of one extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
  pub stage:   &'static str,
  #[serde(flatten)]
  pub outcome: Outcome,
}

/// Everything a run did, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
  pub schema:    SchemaStatus,
  pub stages:    Vec<StageReport>,
  pub committed: bool,
}

impl RunReport {
  /// True when the transaction committed and no stage failed.
  pub fn succeeded(&self) -> bool {
    self.committed && !self.stages.iter().any(|s| s.outcome.is_failed())
  }

  /// Total rows written across loaded stages.
  pub fn rows_loaded(&self) -> usize { self.stages.iter().map(|s| s.outcome.count()).sum() }

  pub fn failure(&self) -> Option<&StageReport> {
    self.stages.iter().find(|s| s.outcome.is_failed())
  }
}

/// Stage label used when the final commit itself fails.
pub const COMMIT_STAGE: &str = "COMMIT";

// ─── Run ─────────────────────────────────────────────────────────────────────

/// Load every source into `sink` as one transaction.
///
/// The schema script is applied first; its failure is reported but does not
/// stop the run. Extractors then run in order. A skipped stage empties the
/// tables it owns and the run continues; the first failed stage stops the
/// run and everything written so far is rolled back.
pub fn run<S: Sink>(
  mut sink:    S,
  data_dir:    &Path,
  schema_file: &Path,
  extractors:  &[Box<dyn Extractor>],
) -> RunReport {
  tracing::info!("[0] Creating schema from {}...", schema_file.display());
  let schema = sink.init_schema(schema_file);

  let mut stages = Vec::with_capacity(extractors.len());
  for (step, extractor) in extractors.iter().enumerate() {
    let stage = extractor.stage();
    tracing::info!("[{}] Loading {stage} data...", step + 1);

    let outcome = load_stage(&mut sink, extractor.as_ref(), data_dir);
    match &outcome {
      Outcome::Loaded { count } => tracing::info!("{stage}: loaded {count} rows"),
      Outcome::Skipped { reason } => tracing::warn!("{stage}: skipped ({reason})"),
      Outcome::Failed { reason } => tracing::error!("{stage}: {reason}"),
    }

    let failed = outcome.is_failed();
    stages.push(StageReport { stage, outcome });
    if failed {
      break;
    }
  }

  let committed = if stages.iter().any(|s| s.outcome.is_failed()) {
    if let Err(e) = sink.rollback() {
      tracing::error!("rollback failed: {e}");
    }
    tracing::error!("data loading failed; all changes rolled back");
    false
  } else {
    match sink.commit() {
      Ok(()) => {
        tracing::info!("data loading complete");
        true
      }
      Err(e) => {
        tracing::error!("commit failed: {e}");
        stages.push(StageReport { stage: COMMIT_STAGE, outcome: Outcome::failed(e.to_string()) });
        false
      }
    }
  };

  RunReport { schema, stages, committed }
}

fn load_stage<S: Sink>(sink: &mut S, extractor: &dyn Extractor, data_dir: &Path) -> Outcome {
  let (tables, skipped) = match extractor.extract(data_dir) {
    Ok(Extraction::Tables(tables)) => (tables, None),
    Ok(Extraction::Skipped(reason)) => (Vec::new(), Some(reason)),
    Err(e) => return Outcome::failed(e.to_string()),
  };

  let mut count = 0;
  for table in &tables {
    match sink.replace_table(table) {
      Ok(n) => count += n,
      Err(e) => return Outcome::failed(format!("writing {}: {e}", table.name)),
    }
  }

  // Owned tables this run wrote nothing to.
  for &name in extractor.tables() {
    if tables.iter().any(|t| t.name == name) {
      continue;
    }
    match sink.clear_table(name) {
      Ok(0) => {}
      Ok(n) => tracing::info!("{name}: cleared {n} rows left by a previous run"),
      Err(e) => return Outcome::failed(format!("clearing {name}: {e}")),
    }
  }

  match skipped {
    Some(reason) => Outcome::Skipped { reason },
    None => Outcome::Loaded { count },
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, io, path::PathBuf, rc::Rc};

  use mhc_core::{Table, Value};

  use super::*;
  use Canned::*;

  // ─── Fakes ─────────────────────────────────────────────────────────────────

  type Log = Rc<RefCell<Vec<String>>>;

  #[derive(Default)]
  struct RecordingSink {
    log:         Log,
    fail_table:  Option<&'static str>,
    fail_commit: bool,
  }

  impl Sink for RecordingSink {
    type Error = io::Error;

    fn execute_script(&mut self, _script: &str) -> Result<(), io::Error> {
      self.log.borrow_mut().push("schema".into());
      Ok(())
    }

    fn replace_table(&mut self, table: &Table) -> Result<usize, io::Error> {
      if self.fail_table == Some(table.name.as_str()) {
        return Err(io::Error::other("disk full"));
      }
      self.log.borrow_mut().push(format!("replace {}", table.name));
      Ok(table.len())
    }

    fn clear_table(&mut self, name: &str) -> Result<usize, io::Error> {
      self.log.borrow_mut().push(format!("clear {name}"));
      Ok(0)
    }

    fn commit(self) -> Result<(), io::Error> {
      if self.fail_commit {
        return Err(io::Error::other("database is locked"));
      }
      self.log.borrow_mut().push("commit".into());
      Ok(())
    }

    fn rollback(self) -> Result<(), io::Error> {
      self.log.borrow_mut().push("rollback".into());
      Ok(())
    }
  }

  #[derive(Clone, Copy)]
  enum Canned {
    Load(&'static [&'static str]),
    /// Skipped; the slice is the tables the stage owns.
    Skip(&'static [&'static str]),
    Fail,
  }

  /// Extractor returning a canned result.
  struct Fake {
    stage:  &'static str,
    canned: Canned,
  }

  impl Extractor for Fake {
    fn stage(&self) -> &'static str { self.stage }

    fn tables(&self) -> &'static [&'static str] {
      match self.canned {
        Load(names) | Skip(names) => names,
        Fail => &[],
      }
    }

    fn extract(&self, _data_dir: &Path) -> mhc_sources::Result<Extraction> {
      match self.canned {
        Canned::Load(names) => Ok(Extraction::Tables(names.iter().map(|n| one_row(n)).collect())),
        Canned::Skip(_) => Ok(Extraction::skipped("file not found")),
        Canned::Fail => {
          Err(mhc_sources::Error::MissingSource(PathBuf::from("MHC_Participant_Roster.csv")))
        }
      }
    }
  }

  fn one_row(name: &str) -> Table {
    let mut t = Table::new(name, ["Participant_ID"]);
    t.push(vec![Value::from("doe-jane")]).unwrap();
    t
  }

  fn stages(list: &[(&'static str, Canned)]) -> Vec<Box<dyn Extractor>> {
    list
      .iter()
      .map(|&(stage, canned)| Box::new(Fake { stage, canned }) as Box<dyn Extractor>)
      .collect()
  }

  fn run_with(sink: RecordingSink, extractors: &[Box<dyn Extractor>]) -> RunReport {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("schema.sql");
    std::fs::write(&schema, "CREATE TABLE A (x);").unwrap();
    run(sink, dir.path(), &schema, extractors)
  }

  // ─── Tests ─────────────────────────────────────────────────────────────────

  #[test]
  fn all_stages_load_then_commit() {
    let sink = RecordingSink::default();
    let log = sink.log.clone();
    let report = run_with(sink, &stages(&[("a", Load(&["A"])), ("b", Load(&["B", "C"]))]));

    assert!(report.succeeded());
    assert_eq!(report.schema, SchemaStatus::Applied);
    assert_eq!(report.rows_loaded(), 3);
    assert_eq!(report.stages[1].outcome, Outcome::Loaded { count: 2 });
    assert_eq!(*log.borrow(), ["schema", "replace A", "replace B", "replace C", "commit"]);
  }

  #[test]
  fn skipped_stage_does_not_stop_the_run() {
    let sink = RecordingSink::default();
    let log = sink.log.clone();
    let report = run_with(sink, &stages(&[("a", Skip(&["A"])), ("b", Load(&["B", "C"]))]));

    assert!(report.committed);
    assert!(matches!(report.stages[0].outcome, Outcome::Skipped { .. }));
    assert_eq!(*log.borrow(), ["schema", "clear A", "replace B", "replace C", "commit"]);
  }

  #[test]
  fn failed_extractor_stops_and_rolls_back() {
    let sink = RecordingSink::default();
    let log = sink.log.clone();
    let report = run_with(
      sink,
      &stages(&[("a", Load(&["A"])), ("roster", Fail), ("b", Load(&["B", "C"]))]),
    );

    assert!(!report.committed);
    assert!(!report.succeeded());
    assert_eq!(report.stages.len(), 2);
    assert_eq!(report.failure().map(|s| s.stage), Some("roster"));
    assert_eq!(*log.borrow(), ["schema", "replace A", "rollback"]);
  }

  #[test]
  fn sink_error_fails_the_stage() {
    let sink = RecordingSink { fail_table: Some("C"), ..Default::default() };
    let log = sink.log.clone();
    let report = run_with(sink, &stages(&[("b", Load(&["B", "C"]))]));

    let Outcome::Failed { reason } = &report.stages[0].outcome else { panic!("expected failure") };
    assert!(reason.contains("writing C"));
    assert_eq!(log.borrow().last().map(String::as_str), Some("rollback"));
  }

  #[test]
  fn commit_error_is_a_failure() {
    let sink = RecordingSink { fail_commit: true, ..Default::default() };
    let report = run_with(sink, &stages(&[("a", Load(&["A"]))]));

    assert!(!report.committed);
    assert_eq!(report.failure().map(|s| s.stage), Some(COMMIT_STAGE));
  }

  #[test]
  fn missing_schema_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let report = run(
      RecordingSink::default(),
      dir.path(),
      &dir.path().join("absent.sql"),
      &stages(&[("a", Load(&["A"]))]),
    );
    assert_eq!(report.schema, SchemaStatus::Missing);
    assert!(report.succeeded());
  }

  #[test]
  fn report_serializes_with_flat_outcomes() {
    let report = RunReport {
      schema:    SchemaStatus::Applied,
      stages:    vec![StageReport { stage: "RISK ASSESSMENT", outcome: Outcome::Loaded { count: 4 } }],
      committed: true,
    };
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stages"][0]["stage"], "RISK ASSESSMENT");
    assert_eq!(json["stages"][0]["status"], "loaded");
    assert_eq!(json["stages"][0]["count"], 4);
    assert_eq!(json["schema"]["status"], "applied");
  }

  #[test]
  fn config_defaults_fill_missing_keys() {
    let cfg: LoaderConfig = serde_json::from_str(r#"{ "data_dir": "/srv/mhc" }"#).unwrap();
    assert_eq!(cfg.data_dir, PathBuf::from("/srv/mhc"));
    assert_eq!(cfg.database, PathBuf::from("MHC_Project.db"));
    assert_eq!(cfg.schema_file, PathBuf::from("MHC_Schema_DDL.sql"));
  }
}
