//! Core types and pure normalization logic for the MHC loader.
//!
//! This crate has no CSV or database dependencies. It owns the participant
//! key, column resolution, the cell/table model the extractors produce and
//! the [`Sink`](sink::Sink) trait that storage backends implement.

pub mod column;
pub mod error;
pub mod normalize;
pub mod outcome;
pub mod participant;
pub mod sink;
pub mod table;

pub use column::{ColumnRule, Matcher, Resolution, find_column};
pub use error::{Error, Result};
pub use outcome::Outcome;
pub use participant::{ParticipantId, normalize_name};
pub use sink::{SchemaStatus, Sink};
pub use table::{SqlType, Table, Value};
