//! End-to-end loads into a SQLite file in a temporary directory.

use std::{fs, path::Path};

use mhc_core::{Outcome, SchemaStatus};
use mhc_loader::{RunReport, run};
use mhc_store_sqlite::SqliteStore;
use tempfile::TempDir;

const SCHEMA: &str = include_str!("../schema/MHC_Schema_DDL.sql");

const ROSTER: &str = "\
Participant Name,Date Started MHC,Date Ended MHC,Length of MHC,End Status
\"Doe, Jane\",1/15/2023,6/1/2023,137,Graduated
";

const DEMOGRAPHICS: &str = "\
Participant Name,DOB,Gender,Race: White,Race: Black,Race: Native American,Race: Asian,Race: Other
\"Doe, Jane\",4/2/1985,F,0,1,0,0,0
";

// ─── Helpers ─────────────────────────────────────────────────────────────────

struct Workspace {
  dir: TempDir,
}

impl Workspace {
  fn new() -> Self {
    let ws = Self { dir: tempfile::tempdir().unwrap() };
    ws.write("MHC_Schema_DDL.sql", SCHEMA);
    ws
  }

  fn path(&self) -> &Path { self.dir.path() }

  fn write(&self, file: &str, contents: &str) { fs::write(self.path().join(file), contents).unwrap(); }

  fn db_path(&self) -> std::path::PathBuf { self.path().join("MHC_Project.db") }

  fn load(&self) -> RunReport {
    let mut store = SqliteStore::open(self.db_path()).unwrap();
    let session = store.begin().unwrap();
    run(
      session,
      self.path(),
      &self.path().join("MHC_Schema_DDL.sql"),
      &mhc_sources::extractors(),
    )
  }

  fn store(&self) -> SqliteStore { SqliteStore::open(self.db_path()).unwrap() }
}

fn outcome<'r>(report: &'r RunReport, stage: &str) -> &'r Outcome {
  &report
    .stages
    .iter()
    .find(|s| s.stage == stage)
    .unwrap_or_else(|| panic!("no stage {stage}"))
    .outcome
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[test]
fn roster_only_load_commits_and_keeps_schema_tables() {
  let ws = Workspace::new();
  ws.write("MHC_Participant_Roster.csv", ROSTER);
  ws.write("MHC_Demographics.csv", DEMOGRAPHICS);

  let report = ws.load();
  assert!(report.succeeded(), "{report:?}");
  assert_eq!(report.schema, SchemaStatus::Applied);
  assert_eq!(outcome(&report, "PARTICIPANT and MHC_ENROLLMENT"), &Outcome::Loaded { count: 2 });
  assert!(matches!(outcome(&report, "JAIL DATA"), Outcome::Skipped { .. }));

  let store = ws.store();
  assert_eq!(store.row_count("PARTICIPANT").unwrap(), 1);
  assert_eq!(store.row_count("MHC_ENROLLMENT").unwrap(), 1);
  // Tables with no source still exist from the DDL, empty.
  assert_eq!(store.table_names().unwrap().len(), 10);
  assert_eq!(store.row_count("TREATMENT_EPISODE").unwrap(), 0);

  let (race, length): (String, i64) = store
    .connection()
    .query_row(
      "SELECT p.Race_Ethnicity, e.Length_Days
       FROM PARTICIPANT p JOIN MHC_ENROLLMENT e USING (Participant_ID)",
      [],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .unwrap();
  assert_eq!((race.as_str(), length), ("Black", 137));
}

#[test]
fn missing_roster_rolls_back_everything() {
  let ws = Workspace::new();
  ws.write("MHC_Participant_Roster.csv", ROSTER);
  assert!(ws.load().succeeded());

  // Second run: new codes would load, but the roster lost its name column.
  ws.write("MHC_Diagnosis_Codes.csv", "Codes,,,,,\nF20.9,Schizophrenia,,,,\n");
  ws.write("MHC_Participant_Roster.csv", "Name,Date Started MHC\n\"Doe, Jane\",1/1/2023\n");

  let report = ws.load();
  assert!(!report.committed);
  assert_eq!(
    report.failure().map(|s| s.stage),
    Some("PARTICIPANT and MHC_ENROLLMENT")
  );

  let store = ws.store();
  assert_eq!(store.row_count("DIAGNOSIS_CODE").unwrap(), 0);
  assert_eq!(store.row_count("PARTICIPANT").unwrap(), 1);
}

#[test]
fn absent_roster_file_is_fatal() {
  let ws = Workspace::new();
  let report = ws.load();
  assert!(!report.succeeded());
  assert!(matches!(
    outcome(&report, "PARTICIPANT and MHC_ENROLLMENT"),
    Outcome::Failed { .. }
  ));
  // The run stops at the first failure.
  assert_eq!(report.stages.len(), 2);
}

#[test]
fn charges_and_treatment_share_participant_keys() {
  let ws = Workspace::new();
  ws.write("MHC_Participant_Roster.csv", ROSTER);
  ws.write(
    "MHC_Criminal_History_Data.csv",
    "Last Name,First Name,Charge Date,Offense,Class,MHC Status,NG/Dismissed\n\
     Doe,Jane,2/3/2022,Theft,m,Pre-MHC,G/Convicted\n\
     Doe,Jane,,Theft,m,Pre-MHC,\n",
  );
  ws.write(
    "MHC_Treatment_CD_FY24.csv",
    "Client Name,Admission Date,Discharge Date,Agency\n\"DOE, JANE\",7/1/2023,8/1/2023,Eastside\n",
  );

  let report = ws.load();
  assert!(report.succeeded(), "{report:?}");

  let store = ws.store();
  let conn = store.connection();
  let (class, outcome_text): (String, String) = conn
    .query_row(
      "SELECT o.Class, c.Outcome
       FROM PARTICIPANT_CHARGE c JOIN CHARGE_OFFENSE o USING (Offense_ID)
       JOIN PARTICIPANT p USING (Participant_ID)",
      [],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .unwrap();
  assert_eq!((class.as_str(), outcome_text.as_str()), ("M", "Convicted"));

  let (kind, provider): (String, String) = conn
    .query_row(
      "SELECT t.Treatment_Type, t.Provider
       FROM TREATMENT_EPISODE t JOIN PARTICIPANT p USING (Participant_ID)",
      [],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .unwrap();
  assert_eq!((kind.as_str(), provider.as_str()), ("Chemical Dependency", "Eastside"));
}

#[test]
fn missing_schema_file_still_loads() {
  let ws = Workspace::new();
  fs::remove_file(ws.path().join("MHC_Schema_DDL.sql")).unwrap();
  ws.write("MHC_Participant_Roster.csv", ROSTER);

  let report = ws.load();
  assert_eq!(report.schema, SchemaStatus::Missing);
  assert!(report.succeeded());
  assert_eq!(ws.store().table_names().unwrap(), ["MHC_ENROLLMENT", "PARTICIPANT"]);
}

#[test]
fn skipped_source_empties_its_tables() {
  let ws = Workspace::new();
  ws.write("MHC_Participant_Roster.csv", ROSTER);
  ws.write(
    "MHC_Jail_Data_Tracking.csv",
    "Participant Name,Booking Start,Release Date\n\"Doe, Jane\",1/1/2023,1/5/2023\n",
  );
  assert!(ws.load().succeeded());
  assert_eq!(ws.store().row_count("JAIL_DATA").unwrap(), 1);

  fs::remove_file(ws.path().join("MHC_Jail_Data_Tracking.csv")).unwrap();
  let report = ws.load();
  assert!(report.succeeded(), "{report:?}");
  assert!(matches!(outcome(&report, "JAIL DATA"), Outcome::Skipped { .. }));
  assert_eq!(ws.store().row_count("JAIL_DATA").unwrap(), 0);
}

#[test]
fn unwritten_enrollment_is_emptied() {
  let ws = Workspace::new();
  ws.write("MHC_Participant_Roster.csv", ROSTER);
  assert!(ws.load().succeeded());
  assert_eq!(ws.store().row_count("MHC_ENROLLMENT").unwrap(), 1);

  ws.write("MHC_Participant_Roster.csv", "Participant Name,End Status\n\"Doe, Jane\",Active\n");
  assert!(ws.load().succeeded());

  let store = ws.store();
  assert_eq!(store.row_count("PARTICIPANT").unwrap(), 1);
  assert_eq!(store.row_count("MHC_ENROLLMENT").unwrap(), 0);
}

#[test]
fn repeated_psychosocial_headers_load() {
  let ws = Workspace::new();
  ws.write("MHC_Participant_Roster.csv", ROSTER);
  ws.write("MHC_Psychosocial_Assessment.csv", "Name,Note,Note.1,Note\n\"Doe, Jane\",a,b,c\n");

  let report = ws.load();
  assert!(report.succeeded(), "{report:?}");
  assert_eq!(
    ws.store().column_names("PSYCHOSOCIAL_ASSESSMENT").unwrap(),
    ["Participant_ID", "Assessment_Date", "Note", "Note.1", "Note.2"]
  );
}
