//! Per-stage result collected by the orchestrator.

use serde::Serialize;

/// What happened to one extraction stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
  /// Rows were written; `count` sums every table the stage replaced.
  Loaded { count: usize },
  /// The source was absent or unusable; nothing was written.
  Skipped { reason: String },
  /// The run cannot continue and must roll back.
  Failed { reason: String },
}

impl Outcome {
  pub fn skipped(reason: impl Into<String>) -> Self { Outcome::Skipped { reason: reason.into() } }

  pub fn failed(reason: impl Into<String>) -> Self { Outcome::Failed { reason: reason.into() } }

  pub fn is_failed(&self) -> bool { matches!(self, Outcome::Failed { .. }) }

  pub fn count(&self) -> usize {
    match self {
      Outcome::Loaded { count } => *count,
      _ => 0,
    }
  }
}
