//! Core error types for wakealarm-core.
//!
//! Alarm lifecycle failures are reported through [`AlarmError`]; storage,
//! configuration and transfer failures have their own enums. Everything rolls
//! up into [`CoreError`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for wakealarm-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Alarm lifecycle errors
    #[error("Alarm error: {0}")]
    Alarm(#[from] AlarmError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Alarm encode/decode errors
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Errors raised by alarm transitions and the wake-up devices.
///
/// None of these are fatal: callers either report them (snooze refused) or
/// degrade a single output channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlarmError {
    /// Snooze attempted past the configured maximum. No state was changed.
    #[error("Cannot snooze: alarm already snoozed {snooze_count} time(s) (max {max_snooze})")]
    InvalidSnooze { snooze_count: u32, max_snooze: i32 },

    /// The alarm has no media to play.
    #[error("Alarm has no media to play")]
    MissingMedia,

    /// An output device (audio, vibrator, speech engine) is absent or failed.
    #[error("Resource unavailable: {resource}")]
    ResourceUnavailable { resource: String },

    /// No alarm with this id exists in storage.
    #[error("Alarm {0} not found")]
    NotFound(i64),

    /// Hour or minute outside the valid clock range.
    #[error("Invalid alarm time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
}

impl AlarmError {
    pub fn unavailable(resource: impl Into<String>) -> Self {
        AlarmError::ResourceUnavailable {
            resource: resource.into(),
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Errors from the fixed-layout alarm codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Version byte not understood by this build
    #[error("Unsupported alarm encoding version {0}")]
    UnsupportedVersion(u8),

    /// Buffer ended before every field was read
    #[error("Truncated alarm encoding: needed {needed} more byte(s) at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    /// A string field is not valid UTF-8
    #[error("Invalid UTF-8 in field '{0}'")]
    InvalidUtf8(&'static str),

    /// Text form is not valid base64
    #[error("Invalid base64: {0}")]
    Base64(String),

    /// Bytes left over after the last field
    #[error("{0} trailing byte(s) after alarm encoding")]
    TrailingBytes(usize),
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

impl From<base64::DecodeError> for CodecError {
    fn from(err: base64::DecodeError) -> Self {
        CodecError::Base64(err.to_string())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_snooze_message_names_counts() {
        let err = AlarmError::InvalidSnooze {
            snooze_count: 3,
            max_snooze: 3,
        };
        assert_eq!(
            err.to_string(),
            "Cannot snooze: alarm already snoozed 3 time(s) (max 3)"
        );
    }

    #[test]
    fn alarm_error_converts_into_core_error() {
        let core: CoreError = AlarmError::NotFound(7).into();
        assert!(matches!(core, CoreError::Alarm(AlarmError::NotFound(7))));
        assert_eq!(core.to_string(), "Alarm error: Alarm 7 not found");
    }

    #[test]
    fn non_sqlite_failures_become_query_failed() {
        let err = DatabaseError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }
}
