//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error from rusqlite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error when creating directories or files.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration failed to apply.
    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// The database lock was poisoned.
    #[error("Database lock poisoned")]
    LockPoisoned,

    /// No record with the given id.
    #[error("Processed item {0} not found")]
    NotFound(i64),

    /// The record already reached a terminal status.
    #[error("Processed item {id} is already {status}")]
    AlreadyFinalized { id: i64, status: String },

    /// The update does not move the record to a terminal status.
    #[error("Processed item {id} cannot be updated to non-terminal status {status}")]
    NonTerminalUpdate { id: i64, status: String },
}
