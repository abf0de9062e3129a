//! Storage Layer - SQLite-backed persistence
//!
//! One table of interest in practice:
//! - organisations(organisation_name TEXT PRIMARY KEY, url TEXT UNIQUE)
//!
//! The facade is table-agnostic though: callers describe columns at
//! creation time and every operation resolves the schema from the
//! engine's catalog when it needs it.

pub mod schema;
pub mod sqlite;

pub use schema::{ColumnInfo, ColumnSpec, Constraint, SqlType};
pub use sqlite::SqliteStore;
