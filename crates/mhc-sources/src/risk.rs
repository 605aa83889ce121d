//! `RISK_ASSESSMENT`: LS/CMI scores and categories.

use std::path::Path;

use mhc_core::{
  ColumnRule, Matcher, Table, Value,
  normalize::{normalize_date, parse_number},
  normalize_name,
};

use crate::{
  Extraction, Extractor, Frame, PARTICIPANT_NAME, Result, missing_column, missing_file,
};

pub const FILE: &str = "MHC_Risk_Assessment.csv";
pub const TABLE: &str = "RISK_ASSESSMENT";

const DATE: ColumnRule = ColumnRule::new(
  "assessment date",
  &[Matcher::Contains(&["DATE"]), Matcher::Contains(&["ASSESSMENT"])],
);
// A bare "Risk" header is a score, "Risk Level" is a category.
const SCORE: ColumnRule = ColumnRule::new(
  "risk score",
  &[
    Matcher::Contains(&["SCORE", "LS/CMI", "LS CMI"]),
    Matcher::AllOf { all: &["RISK"], none: &["LEVEL", "CATEGORY"] },
  ],
);
const CATEGORY: ColumnRule =
  ColumnRule::new("risk category", &[Matcher::Contains(&["CATEGORY", "LEVEL", "RISK LEVEL"])]);

pub struct RiskAssessments;

impl Extractor for RiskAssessments {
  fn stage(&self) -> &'static str { "RISK ASSESSMENT" }

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
  let date_col = frame.resolve_excluding(&DATE, &[Some(name_col)]);
  let score_col = frame.resolve_excluding(&SCORE, &[Some(name_col), date_col]);
  let category_col = frame.resolve_excluding(&CATEGORY, &[Some(name_col), date_col, score_col]);

  let mut table = Table::new(
    TABLE,
    ["Participant_ID", "Assessment_Date", "Risk_Score", "Risk_Category"],
  );
  for row in frame.rows() {
    let Some(id) = normalize_name(row.at(name_col)) else { continue };
    table.push(vec![
      Value::from(id.into_string()),
      Value::from(normalize_date(row.get(date_col))),
      Value::number(row.get(score_col).and_then(parse_number)),
      Value::from(row.get(category_col)),
    ])?;
  }

  tracing::info!("{} risk assessment records", table.len());
  Ok(Extraction::Tables(vec![table]))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_util::{frame, texts};

  fn table(csv: &str) -> Table {
    match build(&frame(FILE, csv)).unwrap() {
      Extraction::Tables(mut t) => t.remove(0),
      Extraction::Skipped(why) => panic!("skipped: {why}"),
    }
  }

  #[test]
  fn score_and_category_resolve_separately() {
    let t = table(
      "Participant Name,Assessment Date,Risk Level,LS/CMI Total Score\n\
       \"Doe, Jane\",2023-04-01,Medium,17\n\
       \"Roe, Rick\",4/2/2023,High,twenty\n",
    );
    assert_eq!(t.rows[0][2], Value::Integer(17));
    assert_eq!(t.rows[1][2], Value::Null);
    assert_eq!(texts(&t, "Risk_Category"), vec![Some("Medium".to_owned()), Some("High".to_owned())]);
    assert_eq!(texts(&t, "Assessment_Date")[1].as_deref(), Some("2023-04-02"));
  }

  #[test]
  fn bare_risk_header_is_the_score() {
    let t = table("Name,Risk,Risk Category\n\"Doe, Jane\",22.5,High\n");
    assert_eq!(t.rows[0][2], Value::Real(22.5));
    assert_eq!(texts(&t, "Risk_Category"), vec![Some("High".to_owned())]);
  }

  #[test]
  fn optional_columns_may_be_absent() {
    let t = table("Name\n\"Doe, Jane\"\n");
    assert_eq!(t.rows, vec![vec![Value::from("doe-jane"), Value::Null, Value::Null, Value::Null]]);
  }

  #[test]
  fn rows_without_name_are_dropped() {
    let t = table("Name,Score\n,10\n\"Doe, Jane\",12\n");
    assert_eq!(texts(&t, "Participant_ID"), vec![Some("doe-jane".to_owned())]);
  }

  #[test]
  fn missing_name_column_skips() {
    let out = build(&frame(FILE, "Score,Level\n1,Low\n")).unwrap();
    assert!(matches!(out, Extraction::Skipped(_)));
  }
}
