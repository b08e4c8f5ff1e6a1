//! Core error types for respira-core.
//!
//! Persistence failures on mutation paths never reach callers (they are
//! logged and swallowed by the stores); these types surface from the
//! explicitly fallible entry points: opening storage, loading config and
//! constructing or adding programs.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for respira-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

    /// Store refused the write
    #[error("Store unavailable: {0}")]
    Unavailable(String),
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

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(#[from] toml::de::Error),

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
}

/// Program validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Program name is blank
    #[error("Program name must not be empty")]
    EmptyName,

    /// A phase that must be positive was zero
    #[error("{phase} duration must be greater than zero")]
    ZeroDuration { phase: &'static str },

    /// Cycle count below one
    #[error("Cycle count must be at least 1")]
    ZeroCycles,

    /// Another program already uses this id
    #[error("A program with id {0} already exists")]
    DuplicateId(uuid::Uuid),

    /// User-authored programs cannot claim the built-in flag
    #[error("Custom programs cannot be marked built-in")]
    BuiltInFlag,
}

/// Result type alias for respira-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
