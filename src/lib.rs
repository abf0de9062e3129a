//! # Register Explorer
//!
//! Tooling around the public register of recognised sponsor organisations.
//!
//! Register Explorer provides:
//! - A thin CRUD facade over an embedded SQLite database for the
//!   organisation table
//! - A scraper for the public registry page (row-header cells carry the
//!   organisation names)
//! - A search-API client that resolves an organisation name to its first
//!   result link

pub mod config;
pub mod logging;
pub mod scrape;
pub mod store;

// Re-exports for convenient access
pub use store::{ColumnInfo, ColumnSpec, Constraint, SqlType, SqliteStore};

/// Result type alias for Register Explorer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Register Explorer operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Not connected to the database")]
    NotConnected,

    #[error("No primary key defined for table '{0}'")]
    NoPrimaryKey(String),

    #[error("Transport error: {0}")]
    Transport(#[from] Box<ureq::Error>),

    #[error("Scrape error: {0}")]
    Scrape(String),

    #[error("Search API returned status {status}: {body}")]
    SearchApi { status: u16, body: String },

    #[error("Malformed search response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        Error::Transport(Box::new(e))
    }
}
