//! `PSYCHOSOCIAL_ASSESSMENT`: intake assessments.
//!
//! The assessment form changes too often to map field by field. Besides the
//! participant and date, the first [`MAX_EXTRA_COLUMNS`] remaining columns
//! are carried through under their own headers with their cells as text.

use std::path::Path;

use mhc_core::{ColumnRule, Matcher, Table, Value, normalize::normalize_date, normalize_name};

use crate::{CLIENT_NAME, Extraction, Extractor, Frame, Result, missing_column, missing_file};

pub const FILE: &str = "MHC_Psychosocial_Assessment.csv";
pub const TABLE: &str = "PSYCHOSOCIAL_ASSESSMENT";

pub const MAX_EXTRA_COLUMNS: usize = 10;

const ID_COLUMN: &str = "Participant_ID";
const DATE_COLUMN: &str = "Assessment_Date";

const DATE: ColumnRule = ColumnRule::new(
  "assessment date",
  &[Matcher::Contains(&["DATE"]), Matcher::Contains(&["ASSESSMENT", "COMPLETED"])],
);

pub struct PsychosocialAssessments;

impl Extractor for PsychosocialAssessments {
  fn stage(&self) -> &'static str { "PSYCHOSOCIAL ASSESSMENT" }

  fn tables(&self) -> &'static [&'static str] { &[TABLE] }

  fn extract(&self, data_dir: &Path) -> Result<Extraction> {
    match Frame::open(&data_dir.join(FILE))? {
      Some(frame) => build(&frame),
      None => Ok(missing_file(FILE)),
    }
  }
}

fn build(frame: &Frame) -> Result<Extraction> {
  let Some(name_col) = frame.resolve(&CLIENT_NAME) else {
    return Ok(missing_column(frame, &CLIENT_NAME));
  };
  let date_col = frame.resolve_excluding(&DATE, &[Some(name_col)]);

  let extra: Vec<usize> = frame
    .headers()
    .iter()
    .enumerate()
    .filter(|&(i, h)| {
      i != name_col && Some(i) != date_col && h != ID_COLUMN && h != DATE_COLUMN
    })
    .map(|(i, _)| i)
    .take(MAX_EXTRA_COLUMNS)
    .collect();

  let columns = [ID_COLUMN, DATE_COLUMN]
    .into_iter()
    .chain(extra.iter().map(|&i| frame.headers()[i].as_str()));
  let mut table = Table::new(TABLE, columns);

  for row in frame.rows() {
    let Some(id) = normalize_name(row.at(name_col)) else { continue };
    let mut cells = Vec::with_capacity(2 + extra.len());
    cells.push(Value::from(id.into_string()));
    cells.push(Value::from(normalize_date(row.get(date_col))));
    cells.extend(extra.iter().map(|&i| Value::from(row.at(i))));
    table.push(cells)?;
  }

  tracing::info!("{} psychosocial assessment records", table.len());
  Ok(Extraction::Tables(vec![table]))
}
