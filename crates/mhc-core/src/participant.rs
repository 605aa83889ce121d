//! Participant key: the join key shared by every source file.
//!
//! Sources spell names differently ("Smith, John", "SMITH,JOHN", separate
//! first/last columns). All of them are funnelled through
//! [`normalize_name`] so the same person lands on the same key.

use serde::{Deserialize, Serialize};

/// Canonical participant identifier derived from a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
  pub fn into_string(self) -> String { self.0 }
}

/// Map a free-text name to its participant key.
///
/// Lowercases, removes spaces, turns commas into hyphens, drops periods and
/// forward slashes, then trims. Absent input, or input that normalizes to the
/// empty string, yields `None`.
pub fn normalize_name(raw: Option<&str>) -> Option<ParticipantId> {
  let raw = raw?;
  let key: String = raw
    .to_lowercase()
    .chars()
    .filter_map(|c| match c {
      ' ' | '.' | '/' => None,
      ',' => Some('-'),
      other => Some(other),
    })
    .collect();
  let key = key.trim();
  (!key.is_empty()).then(|| ParticipantId(key.to_owned()))
}

/// Build the key for sources that carry first and last name separately.
///
/// The parts are joined as `"Last, First"` so the key matches the roster's
/// single-column form. Both parts are required.
pub fn normalize_split_name(last: Option<&str>, first: Option<&str>) -> Option<ParticipantId> {
  let (last, first) = (last?.trim(), first?.trim());
  normalize_name(Some(&format!("{last}, {first}")))
}
