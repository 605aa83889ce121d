//! `JAIL_DATA`: jail stays with length and cost.

use std::path::Path;

use mhc_core::{
  ColumnRule, Matcher, Table, Value,
  normalize::{format_date, parse_date, parse_number},
  normalize_name,
};

use crate::{
  Extraction, Extractor, Frame, PARTICIPANT_NAME, Result, missing_column, missing_file,
};

pub const FILE: &str = "MHC_Jail_Data_Tracking.csv";
pub const TABLE: &str = "JAIL_DATA";

const START: ColumnRule = ColumnRule::new(
  "start date",
  &[Matcher::Contains(&["START", "BEGIN", "ADMISSION", "FROM"])],
);
const END: ColumnRule = ColumnRule::new(
  "end date",
  &[Matcher::Contains(&["END", "RELEASE", "DISCHARGE"]), Matcher::Exact(&["TO"])],
);
const DAYS: ColumnRule =
  ColumnRule::new("days", &[Matcher::Contains(&["DAYS", "LENGTH", "DURATION"])]);
const COST: ColumnRule =
  ColumnRule::new("cost", &[Matcher::Contains(&["COST", "AMOUNT", "FEE", "CHARGE"])]);

pub struct JailData;

impl Extractor for JailData {
  fn stage(&self) -> &'static str { "JAIL DATA" }

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
  let start_col = frame.resolve_excluding(&START, &[Some(name_col)]);
  let end_col = frame.resolve_excluding(&END, &[Some(name_col), start_col]);
  let days_col = frame.resolve_excluding(&DAYS, &[Some(name_col), start_col, end_col]);
  let cost_col = frame.resolve_excluding(&COST, &[Some(name_col), start_col, end_col, days_col]);

  let mut table =
    Table::new(TABLE, ["Participant_ID", "Start_Date", "End_Date", "Days_Incarcerated", "Cost"]);
  let mut derived = 0usize;
  for row in frame.rows() {
    let Some(id) = normalize_name(row.at(name_col)) else { continue };
    let start = row.get(start_col).and_then(parse_date);
    let end = row.get(end_col).and_then(parse_date);

    let days = match (row.get(days_col).and_then(parse_number), start, end) {
      (Some(days), ..) => Value::number(Some(days)),
      (None, Some(start), Some(end)) => {
        derived += 1;
        Value::Integer((end - start).num_days())
      }
      _ => Value::Null,
    };

    table.push(vec![
      Value::from(id.into_string()),
      Value::from(start.map(format_date)),
      Value::from(end.map(format_date)),
      days,
      Value::number(row.get(cost_col).and_then(parse_number)),
    ])?;
  }

  if derived > 0 {
    tracing::debug!("{FILE}: derived days incarcerated for {derived} rows from their dates");
  }
  tracing::info!("{} jail data records", table.len());
  Ok(Extraction::Tables(vec![table]))
}
