//! Error types for focusdesk-core.
//!
//! None of these are fatal to the timer engine: persistence and notification
//! failures are logged and the engine keeps going with its in-memory state.
//! They surface as `Result`s only at the port boundaries and in the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the key-value persistence port.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The backing store cannot be reached at all
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Failed to open the SQLite database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    /// Value could not be encoded or decoded
    #[error("Serialization failed for key '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of the notifier port.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Audible cue could not be played
    #[error("Sound playback failed: {0}")]
    Sound(String),

    /// Alert could not be shown
    #[error("Alert delivery failed: {0}")]
    Alert(String),
}

/// Application settings file errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Home/config directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(#[source] std::io::Error),

    /// Failed to read the settings file
    #[error("Failed to load settings from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to write the settings file
    #[error("Failed to save settings to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },
}

/// Errors from the dot-key accessors on the timer configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigKeyError {
    /// Key does not name a configuration field
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Value does not parse as the field's type
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
