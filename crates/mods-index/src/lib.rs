//! Local SQLite trace store.
//!
//! [`SqliteStore`] implements [`mods_types::TraceStore`] over a single database
//! file so the query adapters can run without a remote backend.

mod db;
mod error;
mod queries;
mod records;
mod schema;
mod store;

pub use db::SqliteStore;
pub use error::{Error, Result};
pub use records::{ImportSummary, NewObject, StoreDump};
pub use schema::SCHEMA_VERSION;
