//! `PARTICIPANT_DIAGNOSIS`: diagnoses recorded at MHC entry.

use std::path::Path;

use mhc_core::{ColumnRule, Matcher, Table, Value, normalize::normalize_date, normalize_name};

use crate::{
  Extraction, Extractor, Frame, PARTICIPANT_NAME, Result, missing_column, missing_file,
};

pub const FILE: &str = "MHC_Mental_Health_Entry.csv";
pub const TABLE: &str = "PARTICIPANT_DIAGNOSIS";

const CODE: ColumnRule = ColumnRule::new(
  "diagnosis code",
  &[Matcher::Contains(&["CODE", "DX"]), Matcher::Contains(&["DIAGNOSIS"])],
);
const DESCRIPTION: ColumnRule = ColumnRule::new(
  "diagnosis description",
  &[Matcher::Contains(&["DESCRIPTION", "CONDITION"]), Matcher::Contains(&["DIAGNOSIS"])],
);
const DATE: ColumnRule = ColumnRule::new(
  "assessment date",
  &[Matcher::Contains(&["DATE"]), Matcher::Contains(&["ASSESSMENT", "ENTRY"])],
);

pub struct MentalHealth;

impl Extractor for MentalHealth {
  fn stage(&self) -> &'static str { "MENTAL HEALTH DIAGNOSIS" }

  fn tables(&self) -> &'static [&'static str] { &[TABLE] }

  fn extract(&self, data_dir: &Path) -> Result<Extraction> {
    match Frame::open(&data_dir.join(FILE))? {
      Some(frame) => build(&frame),
      None => Ok(missing_file(FILE)),
    }
  }
}

fn build(frame: &Frame) -> Result<Extraction> {
  let Some(name_col) = frame.resolve(&PARTICIPANT_NAME) else {
    return Ok(missing_column(frame, &PARTICIPANT_NAME));
  };
  let Some(code_col) = frame.resolve_excluding(&CODE, &[Some(name_col)]) else {
    return Ok(missing_column(frame, &CODE));
  };
  let desc_col = frame.resolve_excluding(&DESCRIPTION, &[Some(name_col), Some(code_col)]);
  let date_col = frame.resolve_excluding(&DATE, &[Some(name_col), Some(code_col), desc_col]);

  let mut table = Table::new(
    TABLE,
    ["Participant_ID", "Diagnosis_Code", "Diagnosis_Description", "Assessment_Date"],
  );
  for row in frame.rows() {
    let (Some(id), Some(code)) = (normalize_name(row.at(name_col)), row.at(code_col)) else {
      continue;
    };
    table.push(vec![
      Value::from(id.into_string()),
      Value::from(code),
      Value::from(row.get(desc_col)),
      Value::from(normalize_date(row.get(date_col))),
    ])?;
  }

  tracing::info!("{} mental health diagnosis records", table.len());
  Ok(Extraction::Tables(vec![table]))
}
