//! `CHARGE_OFFENSE` and `PARTICIPANT_CHARGE`: criminal history.
//!
//! Offenses are normalized out of the charge rows: each distinct raw
//! (offense, class) pair becomes one `CHARGE_OFFENSE` row with a sequential
//! id, assigned in first-seen order. Charge rows then reference that id.

use std::{collections::HashMap, path::Path};

use mhc_core::{
  ColumnRule, Matcher, Table, Value,
  normalize::normalize_date,
  participant::normalize_split_name,
};

use crate::{Extraction, Extractor, Frame, Result, missing_column, missing_file};

pub const FILE: &str = "MHC_Criminal_History_Data.csv";
pub const OFFENSE_TABLE: &str = "CHARGE_OFFENSE";
pub const CHARGE_TABLE: &str = "PARTICIPANT_CHARGE";

const CONVICTED_RAW: &str = "G/Convicted";
const CONVICTED: &str = "Convicted";

// ─── Column rules ────────────────────────────────────────────────────────────

const CHARGE_DATE: ColumnRule = ColumnRule::new(
  "charge date",
  &[
    Matcher::Exact(&["CHARGE DATE"]),
    Matcher::AllOf { all: &["CHARGE", "DATE"], none: &["MHC"] },
  ],
);
const FIRST_NAME: ColumnRule =
  ColumnRule::new("first name", &[Matcher::Exact(&["FIRST NAME"]), Matcher::Contains(&["FIRST"])]);
const LAST_NAME: ColumnRule =
  ColumnRule::new("last name", &[Matcher::Exact(&["LAST NAME"]), Matcher::Contains(&["LAST"])]);
const OFFENSE: ColumnRule =
  ColumnRule::new("offense", &[Matcher::Exact(&["OFFENSE"]), Matcher::Contains(&["OFFENSE"])]);
const CLASS: ColumnRule =
  ColumnRule::new("class", &[Matcher::Exact(&["CLASS"]), Matcher::Contains(&["CLASS"])]);
const MHC_STATUS: ColumnRule = ColumnRule::new(
  "MHC status",
  &[Matcher::Exact(&["MHC STATUS"]), Matcher::Contains(&["MHC", "STATUS"])],
);
const OUTCOME: ColumnRule = ColumnRule::new(
  "outcome",
  &[Matcher::Exact(&["NG/DISMISSED"]), Matcher::Contains(&["DISMISSED", "OUTCOME"])],
);

// ─── Extractor ───────────────────────────────────────────────────────────────

pub struct CriminalCharges;

impl Extractor for CriminalCharges {
  fn stage(&self) -> &'static str { "CRIMINAL CHARGE" }

  fn tables(&self) -> &'static [&'static str] { &[OFFENSE_TABLE, CHARGE_TABLE] }

  fn extract(&self, data_dir: &Path) -> Result<Extraction> {
    match Frame::open(&data_dir.join(FILE))? {
      Some(frame) => build(&frame),
      None => Ok(missing_file(FILE)),
    }
  }
}

/// Raw (offense, class) cells identifying one offense.
type OffenseKey<'f> = (Option<&'f str>, Option<&'f str>);

fn build(frame: &Frame) -> Result<Extraction> {
  let Some(date_col) = frame.resolve(&CHARGE_DATE) else {
    return Ok(missing_column(frame, &CHARGE_DATE));
  };
  let Some(first_col) = frame.resolve(&FIRST_NAME) else {
    return Ok(missing_column(frame, &FIRST_NAME));
  };
  let Some(last_col) = frame.resolve_excluding(&LAST_NAME, &[Some(first_col)]) else {
    return Ok(missing_column(frame, &LAST_NAME));
  };
  let Some(offense_col) = frame.resolve(&OFFENSE) else {
    return Ok(missing_column(frame, &OFFENSE));
  };
  let Some(class_col) = frame.resolve_excluding(&CLASS, &[Some(offense_col)]) else {
    return Ok(missing_column(frame, &CLASS));
  };
  let status_col = frame.resolve_excluding(&MHC_STATUS, &[Some(date_col)]);
  let outcome_col = frame.resolve(&OUTCOME);

  // An undated row is not a charge event.
  let dated: Vec<_> = frame.rows().filter(|row| row.at(date_col).is_some()).collect();

  let mut offense_ids: HashMap<OffenseKey<'_>, i64> = HashMap::new();
  let mut offenses = Table::new(OFFENSE_TABLE, ["Offense_ID", "Offense_Name", "Class"]);
  for row in &dated {
    let key = (row.at(offense_col), row.at(class_col));
    if offense_ids.contains_key(&key) {
      continue;
    }
    let id = offense_ids.len() as i64 + 1;
    offense_ids.insert(key, id);
    offenses.push(vec![
      Value::Integer(id),
      Value::from(key.0),
      Value::from(key.1.map(str::to_uppercase)),
    ])?;
  }

  let mut charges = Table::new(
    CHARGE_TABLE,
    ["Participant_ID", "Offense_ID", "Charge_Date", "Status_at_Charge", "Outcome"],
  );
  for row in &dated {
    let Some(id) = normalize_split_name(row.at(last_col), row.at(first_col)) else { continue };
    let offense_id = offense_ids[&(row.at(offense_col), row.at(class_col))];
    charges.push(vec![
      Value::from(id.into_string()),
      Value::Integer(offense_id),
      Value::from(normalize_date(row.at(date_col))),
      Value::from(row.get(status_col)),
      Value::from(row.get(outcome_col).map(normalize_outcome)),
    ])?;
  }

  tracing::info!("{} unique charge offenses, {} participant charges", offenses.len(), charges.len());
  Ok(Extraction::Tables(vec![offenses, charges]))
}

fn normalize_outcome(raw: &str) -> String { raw.replace(CONVICTED_RAW, CONVICTED).trim().to_owned() }
