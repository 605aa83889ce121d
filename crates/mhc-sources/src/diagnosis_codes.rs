//! `DIAGNOSIS_CODE`: reference list of diagnosis codes.
//!
//! The export lays out two independent code/description pairs side by side
//! (columns 0-1 and 4-5) under a free-form title row. Both pairs are unioned
//! and deduplicated by code, first occurrence winning.

use std::{collections::HashSet, path::Path};

use mhc_core::{Table, Value};

use crate::{Extraction, Extractor, Frame, Result, missing_file};

pub const FILE: &str = "MHC_Diagnosis_Codes.csv";
pub const TABLE: &str = "DIAGNOSIS_CODE";

const PAIRS: [(usize, usize); 2] = [(0, 1), (4, 5)];

pub struct DiagnosisCodes;

impl Extractor for DiagnosisCodes {
  fn stage(&self) -> &'static str { TABLE }

  fn tables(&self) -> &'static [&'static str] { &[TABLE] }

  fn extract(&self, data_dir: &Path) -> Result<Extraction> {
    let Some(frame) = Frame::open_headerless(&data_dir.join(FILE))? else {
      return Ok(missing_file(FILE));
    };
    Ok(Extraction::Tables(vec![build(&frame)?]))
  }
}

fn build(frame: &Frame) -> Result<Table> {
  let mut seen = HashSet::new();
  let mut table = Table::new(TABLE, ["Code", "Description"]);

  for (code_col, desc_col) in PAIRS {
    for row in frame.rows().skip(1) {
      let Some(code) = row.at(code_col) else { continue };
      if seen.insert(code) {
        table.push(vec![Value::from(code), Value::from(row.at(desc_col))])?;
      }
    }
  }

  tracing::info!("{} unique diagnosis codes", table.len());
  Ok(table)
}
