//! Persistence layer for rebootwarden
//!
//! Provides:
//! - The persisted enforcement record (last notification, user schedule, count)
//! - A JSON file backend
//! - A SQLite key/value backend
//!
//! Both backends read and write the whole record at once.

mod json;
mod sqlite;
mod traits;

pub use json::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The persisted record exists but cannot be understood
    #[error("Corrupt state record: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
