//! SQLite backend for the MHC loader.
//!
//! [`SqliteStore`] owns the single connection for a run; [`Session`] is the
//! one transaction every extractor writes through.

mod encode;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{Session, SqliteStore};
