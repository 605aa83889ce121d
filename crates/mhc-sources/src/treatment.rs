//! `TREATMENT_EPISODE`: mental health and chemical dependency treatment.
//!
//! Episodes arrive as one file per program and fiscal year plus a historical
//! file. Each file is read on its own and a bad file is skipped without
//! affecting the rest; the stage itself is skipped only when no file loads.

use std::{fmt, path::Path};

use mhc_core::{ColumnRule, Matcher, Table, Value, normalize::normalize_date, normalize_name};

use crate::{CLIENT_NAME, Extraction, Extractor, Frame, Result};

pub const TABLE: &str = "TREATMENT_EPISODE";

pub const FILES: [&str; 7] = [
  "MHC_Treatment_MH_FY23.csv",
  "MHC_Treatment_MH_FY24.csv",
  "MHC_Treatment_MH_FY25.csv",
  "MHC_Treatment_CD_FY23.csv",
  "MHC_Treatment_CD_FY24.csv",
  "MHC_Treatment_CD_FY25.csv",
  "MHC_Treatment_Historical.csv",
];

const COLUMNS: [&str; 7] = [
  "Participant_ID",
  "Treatment_Type",
  "Start_Date",
  "End_Date",
  "Service_Type",
  "Provider",
  "Outcome",
];

// ─── Column rules ────────────────────────────────────────────────────────────

const START: ColumnRule = ColumnRule::new(
  "start date",
  &[
    Matcher::Contains(&["START", "BEGIN", "ADMISSION"]),
    Matcher::AllOf { all: &["DATE"], none: &["END", "COMPLETION", "DISCHARGE"] },
  ],
);
const END: ColumnRule =
  ColumnRule::new("end date", &[Matcher::Contains(&["END", "COMPLETION", "DISCHARGE"])]);
const SERVICE_TYPE: ColumnRule = ColumnRule::new(
  "service type",
  &[Matcher::Contains(&["TYPE", "SERVICE", "TREATMENT", "MODALITY"])],
);
const PROVIDER: ColumnRule =
  ColumnRule::new("provider", &[Matcher::Contains(&["PROVIDER", "FACILITY", "AGENCY"])]);
const OUTCOME: ColumnRule = ColumnRule::new(
  "outcome",
  &[Matcher::Contains(&["OUTCOME", "RESULT", "STATUS", "COMPLETION"])],
);

// ─── Treatment type ──────────────────────────────────────────────────────────

/// Program a treatment file belongs to, read from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreatmentType {
  MentalHealth,
  ChemicalDependency,
  Unknown,
}

impl TreatmentType {
  /// Classify by the `MH` / `CD` segment of an underscore-separated file
  /// name, e.g. `MHC_Treatment_CD_FY24.csv`.
  pub fn from_file_name(file: &str) -> Self {
    let stem = file.strip_suffix(".csv").unwrap_or(file);
    stem
      .split('_')
      .find_map(|segment| match segment.to_ascii_uppercase().as_str() {
        "MH" => Some(TreatmentType::MentalHealth),
        "CD" => Some(TreatmentType::ChemicalDependency),
        _ => None,
      })
      .unwrap_or(TreatmentType::Unknown)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      TreatmentType::MentalHealth => "Mental Health",
      TreatmentType::ChemicalDependency => "Chemical Dependency",
      TreatmentType::Unknown => "Unknown",
    }
  }
}

impl fmt::Display for TreatmentType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Unions the episodes of every listed file that loads.
pub struct TreatmentEpisodes {
  pub files: Vec<&'static str>,
}

impl Default for TreatmentEpisodes {
  fn default() -> Self { Self { files: FILES.to_vec() } }
}

impl Extractor for TreatmentEpisodes {
  fn stage(&self) -> &'static str { "TREATMENT EPISODES" }

  fn tables(&self) -> &'static [&'static str] { &[TABLE] }

  fn extract(&self, data_dir: &Path) -> Result<Extraction> {
    let mut all = Table::new(TABLE, COLUMNS);
    let mut loaded = 0usize;

    for &file in &self.files {
      let frame = match Frame::open(&data_dir.join(file)) {
        Ok(Some(frame)) => frame,
        Ok(None) => {
          tracing::warn!("{file} not found, skipping");
          continue;
        }
        Err(e) => {
          tracing::warn!("error reading {file}, skipping: {e}");
          continue;
        }
      };
      match episodes(&frame, TreatmentType::from_file_name(file)) {
        Ok(Some(table)) => {
          tracing::info!("{} records from {file}", table.len());
          all.rows.extend(table.rows);
          loaded += 1;
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("error processing {file}, skipping: {e}"),
      }
    }

    if loaded == 0 {
      return Ok(Extraction::skipped("no treatment file could be loaded"));
    }
    tracing::info!("{} treatment episodes from {loaded} files", all.len());
    Ok(Extraction::Tables(vec![all]))
  }
}

/// Episodes of one file, or `None` when it has no participant column.
fn episodes(frame: &Frame, kind: TreatmentType) -> Result<Option<Table>> {
  let Some(name_col) = frame.resolve(&CLIENT_NAME) else {
    tracing::warn!(
      "{}: could not find participant name column, skipping; available columns: {:?}",
      frame.name(),
      frame.headers()
    );
    return Ok(None);
  };
  let mut taken = vec![Some(name_col)];
  let mut claim = |rule: &ColumnRule| {
    let col = frame.resolve_excluding(rule, &taken);
    taken.push(col);
    col
  };
  let start_col = claim(&START);
  let end_col = claim(&END);
  let type_col = claim(&SERVICE_TYPE);
  let provider_col = claim(&PROVIDER);
  let outcome_col = claim(&OUTCOME);

  let mut table = Table::new(TABLE, COLUMNS);
  for row in frame.rows() {
    let Some(id) = normalize_name(row.at(name_col)) else { continue };
    table.push(vec![
      Value::from(id.into_string()),
      Value::from(kind.as_str()),
      Value::from(normalize_date(row.get(start_col))),
      Value::from(normalize_date(row.get(end_col))),
      Value::from(row.get(type_col)),
      Value::from(row.get(provider_col)),
      Value::from(row.get(outcome_col)),
    ])?;
  }
  Ok(Some(table))
}
