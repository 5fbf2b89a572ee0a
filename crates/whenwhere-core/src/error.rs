//! Core error types for whenwhere-core.
//!
//! Value construction, record validation, storage, configuration and
//! geocoding each have their own enum; [`CoreError`] aggregates them for
//! the engine entry points.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for whenwhere-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid day/time value or unparseable name
    #[error(transparent)]
    Value(#[from] ValueError),

    /// A record failed validation before save
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A mandatory record id did not resolve
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Geocoding errors
    #[error("Geocoding error: {0}")]
    Geocode(#[from] GeocodeError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Errors raised while constructing or parsing value types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Numeric code outside the valid domain
    #[error("{kind} out of range: {value}")]
    OutOfRange { kind: &'static str, value: i64 },

    /// Weekday name lookup failed
    #[error("Unknown day name: '{0}'")]
    UnknownDayName(String),

    /// Time of day not in HH:MM form
    #[error("Invalid time of day: '{0}' (expected HH:MM)")]
    InvalidTimeOfDay(String),

    /// Time frame outside now/today/tomorrow/week
    #[error("Unknown time frame: '{0}'")]
    UnknownTimeFrame(String),
}

/// A single field-level validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[error("{field} {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All validation failures for one record, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Whether any error was recorded against `field`.
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

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

    /// Stored value could not be decoded
    #[error("Corrupt value in column '{column}': {message}")]
    Corrupt { column: &'static str, message: String },

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

    /// Failed to locate the data directory
    #[error("Cannot determine data directory: {0}")]
    DataDir(String),
}

/// Geocoding errors.
#[derive(Error, Debug)]
pub enum GeocodeError {
    /// Geocoding turned off in configuration
    #[error("geocoding is disabled")]
    Disabled,

    /// HTTP request failed
    #[error("request failed: {0}")]
    Request(String),

    /// The service returned no match for the address
    #[error("no result for address '{0}'")]
    NoResult(String),

    /// The service answered with something unparseable
    #[error("malformed response: {0}")]
    Malformed(String),
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
                {
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

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        GeocodeError::Request(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
