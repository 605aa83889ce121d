//! `PARTICIPANT` and `MHC_ENROLLMENT`: the roster joined with demographics.
//!
//! The roster is authoritative for which participants exist. Demographics are
//! left-joined on the participant key; a participant with no demographics row
//! simply has those fields absent.
//!
//! A missing roster file or roster name column aborts the run.

use std::{
  collections::{HashMap, HashSet},
  path::Path,
};

use mhc_core::{
  ColumnRule, Matcher, ParticipantId, Table, Value,
  normalize::{format_date, is_flag_set, normalize_date, parse_date, parse_number},
  normalize_name,
};

use crate::{Error, Extraction, Extractor, Frame, Result};

pub const ROSTER_FILE: &str = "MHC_Participant_Roster.csv";
pub const DEMOGRAPHICS_FILE: &str = "MHC_Demographics.csv";

pub const PARTICIPANT_TABLE: &str = "PARTICIPANT";
pub const ENROLLMENT_TABLE: &str = "MHC_ENROLLMENT";

/// Roster column holding `"Last, First"`.
pub const NAME_COLUMN: &str = "Participant Name";

const MULTI_RACIAL: &str = "Multi-Racial";

// ─── Column rules ────────────────────────────────────────────────────────────

const NAME: ColumnRule = ColumnRule::new(NAME_COLUMN, &[Matcher::Exact(&[NAME_COLUMN])]);

const DOB: ColumnRule = ColumnRule::new(
  "date of birth",
  &[Matcher::Exact(&["DOB"]), Matcher::Contains(&["DATE OF BIRTH", "BIRTH"])],
);
const GENDER: ColumnRule =
  ColumnRule::new("gender", &[Matcher::Exact(&["GENDER"]), Matcher::Contains(&["GENDER"])]);

/// Race indicator columns and the category each one stands for.
const RACES: [(ColumnRule, &str); 5] = [
  (
    ColumnRule::new("Race: White", &[
      Matcher::Exact(&["Race: White"]),
      Matcher::AllOf { all: &["RACE", "WHITE"], none: &[] },
    ]),
    "White",
  ),
  (
    ColumnRule::new("Race: Black", &[
      Matcher::Exact(&["Race: Black"]),
      Matcher::AllOf { all: &["RACE", "BLACK"], none: &[] },
    ]),
    "Black",
  ),
  (
    ColumnRule::new("Race: Native American", &[
      Matcher::Exact(&["Race: Native American"]),
      Matcher::AllOf { all: &["RACE", "NATIVE"], none: &[] },
    ]),
    "Native American",
  ),
  (
    ColumnRule::new("Race: Asian", &[
      Matcher::Exact(&["Race: Asian"]),
      Matcher::AllOf { all: &["RACE", "ASIAN"], none: &[] },
    ]),
    "Asian",
  ),
  (
    ColumnRule::new("Race: Other", &[
      Matcher::Exact(&["Race: Other"]),
      Matcher::AllOf { all: &["RACE", "OTHER"], none: &[] },
    ]),
    "Other",
  ),
];

const STARTED: ColumnRule = ColumnRule::new(
  "enrollment start date",
  &[Matcher::Exact(&["Date Started MHC"]), Matcher::Contains(&["STARTED", "START DATE"])],
);
const ENDED: ColumnRule = ColumnRule::new(
  "enrollment end date",
  &[Matcher::Exact(&["Date Ended MHC"]), Matcher::Contains(&["ENDED", "END DATE"])],
);
const LENGTH: ColumnRule = ColumnRule::new(
  "enrollment length",
  &[Matcher::Exact(&["Length of MHC"]), Matcher::Contains(&["LENGTH"])],
);
const END_STATUS: ColumnRule = ColumnRule::new(
  "end status",
  &[Matcher::Exact(&["End Status"]), Matcher::Contains(&["END STATUS", "STATUS"])],
);

// ─── Extractor ───────────────────────────────────────────────────────────────

pub struct Participants;

impl Extractor for Participants {
  fn stage(&self) -> &'static str { "PARTICIPANT and MHC_ENROLLMENT" }

  fn tables(&self) -> &'static [&'static str] { &[PARTICIPANT_TABLE, ENROLLMENT_TABLE] }

  fn extract(&self, data_dir: &Path) -> Result<Extraction> {
    let roster_path = data_dir.join(ROSTER_FILE);
    let roster = Frame::open(&roster_path)?.ok_or(Error::MissingSource(roster_path))?;

    let demographics = match Frame::open(&data_dir.join(DEMOGRAPHICS_FILE))? {
      Some(frame) => Demographics::index(&frame),
      None => {
        tracing::warn!("{DEMOGRAPHICS_FILE} not found; demographic fields will be empty");
        Demographics::default()
      }
    };

    let mut tables = vec![participants(&roster, &demographics)?];
    match enrollment(&roster)? {
      Some(table) => tables.push(table),
      None => tracing::warn!("{ROSTER_FILE}: no enrollment start date column; skipping {ENROLLMENT_TABLE}"),
    }
    Ok(Extraction::Tables(tables))
  }
}

// ─── Demographics ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq)]
struct Demographic {
  date_of_birth:  Option<String>,
  gender:         Option<String>,
  race_ethnicity: Option<&'static str>,
}

/// Demographics keyed by participant; the first row per key wins.
#[derive(Debug, Default)]
struct Demographics(HashMap<ParticipantId, Demographic>);

impl Demographics {
  fn index(frame: &Frame) -> Self {
    let Some(name_col) = frame.resolve(&NAME) else {
      tracing::warn!("{}: no {NAME_COLUMN:?} column; demographic fields will be empty", frame.name());
      return Self::default();
    };
    let dob = frame.resolve(&DOB);
    let gender = frame.resolve(&GENDER);
    let races: Vec<(Option<usize>, &'static str)> =
      RACES.iter().map(|(rule, race)| (frame.resolve(rule), *race)).collect();

    let mut by_id = HashMap::new();
    for row in frame.rows() {
      let Some(id) = normalize_name(row.at(name_col)) else { continue };
      by_id.entry(id).or_insert_with(|| {
        let flagged: Vec<&'static str> = races
          .iter()
          .filter(|(col, _)| is_flag_set(row.get(*col)))
          .map(|(_, race)| *race)
          .collect();
        Demographic {
          date_of_birth:  normalize_date(row.get(dob)),
          gender:         row.get(gender).map(str::to_owned),
          race_ethnicity: race_category(&flagged),
        }
      });
    }
    Self(by_id)
  }

  fn get(&self, id: &ParticipantId) -> Option<&Demographic> { self.0.get(id) }
}

/// Collapse race indicator flags into one category.
fn race_category(flagged: &[&'static str]) -> Option<&'static str> {
  match flagged {
    [] => None,
    [one] => Some(*one),
    _ => Some(MULTI_RACIAL),
  }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

fn name_column(roster: &Frame) -> Result<usize> {
  roster.resolve(&NAME).ok_or_else(|| {
    tracing::error!(
      "FATAL: required column {NAME_COLUMN:?} not found in roster; columns: {:?}",
      roster.headers()
    );
    Error::Core(mhc_core::Error::MissingColumn {
      source_name: roster.name().to_owned(),
      column:      NAME_COLUMN.to_owned(),
    })
  })
}

/// Split `"Last, First"` into `(last, first)`.
fn split_name(name: &str) -> (Option<&str>, Option<&str>) {
  let mut parts = name.split(", ").map(str::trim).map(|p| (!p.is_empty()).then_some(p));
  (parts.next().flatten(), parts.next().flatten())
}

fn participants(roster: &Frame, demographics: &Demographics) -> Result<Table> {
  let name_col = name_column(roster)?;
  let mut table = Table::new(
    PARTICIPANT_TABLE,
    ["Participant_ID", "First_Name", "Last_Name", "Date_of_Birth", "Gender", "Race_Ethnicity"],
  );
  let mut seen = HashSet::new();

  for row in roster.rows() {
    let name = row.at(name_col);
    let Some(id) = normalize_name(name) else { continue };
    if !seen.insert(id.clone()) {
      continue;
    }
    let (last, first) = name.map(split_name).unwrap_or_default();
    let demo = demographics.get(&id).cloned().unwrap_or_default();
    table.push(vec![
      Value::from(id.into_string()),
      Value::from(first),
      Value::from(last),
      Value::from(demo.date_of_birth),
      Value::from(demo.gender),
      Value::from(demo.race_ethnicity),
    ])?;
  }

  tracing::info!("{} unique participants", table.len());
  Ok(table)
}

/// Enrollment spans; `None` when the roster has no start-date column.
fn enrollment(roster: &Frame) -> Result<Option<Table>> {
  let name_col = name_column(roster)?;
  let Some(started) = roster.resolve(&STARTED) else { return Ok(None) };
  let ended = roster.resolve_excluding(&ENDED, &[Some(started)]);
  let length = roster.resolve(&LENGTH);
  let status = roster.resolve_excluding(&END_STATUS, &[Some(started), ended]);

  let mut table = Table::new(
    ENROLLMENT_TABLE,
    ["Participant_ID", "Start_Date", "End_Date", "End_Status", "Length_Days"],
  );

  for row in roster.rows() {
    let Some(id) = normalize_name(row.at(name_col)) else { continue };
    let Some(start) = row.at(started).and_then(parse_date) else { continue };
    table.push(vec![
      Value::from(id.into_string()),
      Value::from(format_date(start)),
      Value::from(normalize_date(row.get(ended))),
      Value::from(row.get(status)),
      Value::number(row.get(length).and_then(parse_number)),
    ])?;
  }

  tracing::info!("{} enrollment records", table.len());
  Ok(Some(table))
}
