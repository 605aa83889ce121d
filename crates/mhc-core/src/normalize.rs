//! Lenient date and number parsing for spreadsheet exports.
//!
//! Every helper degrades to `None` on malformed input; a bad cell never
//! rejects the row it belongs to.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Canonical textual form for every persisted date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Each two-digit-year form precedes its four-digit twin; "%y" rejects four
// digits but "%Y" accepts two.
const DATE_FORMATS: &[&str] = &[
  "%Y-%m-%d",
  "%m/%d/%y",
  "%m/%d/%Y",
  "%m-%d-%y",
  "%m-%d-%Y",
  "%Y/%m/%d",
  "%Y.%m.%d",
  "%d-%b-%y",
  "%d-%b-%Y",
  "%b %d, %Y",
  "%B %d, %Y",
  "%b %d %Y",
  "%B %d %Y",
  "%d %b %Y",
  "%d %B %Y",
  "%Y%m%d",
];

const DATETIME_FORMATS: &[&str] = &[
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M",
  "%m/%d/%Y %H:%M:%S",
  "%m/%d/%Y %H:%M",
  "%m/%d/%Y %I:%M:%S %p",
  "%m/%d/%Y %I:%M %p",
  "%m/%d/%y %H:%M",
];

/// Parse a calendar date written in any of the common export formats.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }

  DATE_FORMATS
    .iter()
    .find_map(|f| NaiveDate::parse_from_str(raw, f).ok().filter(plausible))
    .or_else(|| {
      DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .map(|dt| dt.date())
        .filter(plausible)
    })
    .or_else(|| {
      chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
    })
}

fn plausible(d: &NaiveDate) -> bool { (1000..=9999).contains(&d.year()) }

pub fn format_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

/// Parse then re-render a date cell in [`DATE_FORMAT`].
pub fn normalize_date(raw: Option<&str>) -> Option<String> {
  raw.and_then(parse_date).map(format_date)
}

/// Parse a numeric cell.
///
/// Tolerates surrounding whitespace, a leading `$` and `,` thousands
/// separators. Non-finite results are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
  let trimmed = raw.trim();
  let unsigned = trimmed.strip_prefix('$').unwrap_or(trimmed);
  let cleaned: String = unsigned.chars().filter(|c| *c != ',').collect();
  if cleaned.is_empty() {
    return None;
  }
  cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Whether a boolean indicator cell is set (`1`, `1.0`, or `true`).
pub fn is_flag_set(raw: Option<&str>) -> bool {
  match raw.map(str::trim) {
    Some(s) if s.eq_ignore_ascii_case("true") => true,
    Some(s) => parse_number(s) == Some(1.0),
    None => false,
  }
}
