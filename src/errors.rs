// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileWatchError {
    /// `start()` was called while a session is still running.
    #[error("file watcher cannot start watching new inputs while it is already running")]
    AlreadyRunning,

    /// The worker did not finish within the shutdown deadline.
    ///
    /// The worker may still be running; callers must treat this as fatal.
    #[error("running file watcher was not stopped within {0:?}")]
    StopTimeout(Duration),

    /// Registering the initial watch inputs failed; the session never polled.
    #[error("failed to register watch inputs: {0:#}")]
    RegisterInputs(#[source] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FileWatchError>;
