//! Error types for the placement core.

use uuid::Uuid;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Fan-out error: {0}")]
    Fanout(#[from] FanoutError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Notification fan-out errors.
///
/// Only the population read is fatal to a fan-out. Individual write failures
/// are reported per candidate in the `FanoutReport`.
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    #[error("Failed to read candidates for drive {drive_id}: {source}")]
    Read {
        drive_id: String,
        #[source]
        source: DatabaseError,
    },

    #[error("Failed to store drive {drive_id}: {source}")]
    DriveWrite {
        drive_id: String,
        #[source]
        source: DatabaseError,
    },

    #[error("Notification {id} write failed: {reason}")]
    Write { id: Uuid, reason: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
