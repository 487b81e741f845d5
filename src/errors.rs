// src/errors.rs

//! Crate-wide error types.
//!
//! Each component has its own small error enum so callers (mostly the HTTP
//! layer) can tell failure moments apart. `RecoverdError` wraps all of them
//! for startup code and the binary.

use thiserror::Error;

/// Failures while replacing the staged input set.
#[derive(Error, Debug)]
pub enum StagingError {
    #[error("missing required input: {0}")]
    MissingRequired(&'static str),

    /// The staging area may be partially cleared or written after this.
    #[error("staging I/O failure: {0}")]
    Io(#[source] anyhow::Error),

    #[error("staging area is in use by a running recovery")]
    InUse,
}

/// Failures of `ProcessSupervisor::start`.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("a recovery run is already in progress (run {run_id})")]
    AlreadyRunning { run_id: u64 },

    #[error("failed to launch recovery command '{command}': {source}")]
    LaunchFailure {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while resolving the current backup artifact.
#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("no backup file available in {0}")]
    NotFound(String),

    /// The artifact was listed but could not be read afterwards
    /// (deleted or rotated concurrently). Safe to retry.
    #[error("backup file {name} is no longer readable: {source}")]
    Unreadable {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Error, Debug)]
pub enum RecoverdError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RecoverdError>;
