//! Error types for the txpush core library.
//!
//! Each collaborator has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for the pipeline. Every error is
//! fatal to a run; nothing here is retried.

use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Tx(#[from] TxError),

    #[error(transparent)]
    Notification(#[from] NotificationError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from loading the Transifex config or the txpush settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// A line of the Transifex config could not be understood.
    #[error("configuration parse error at line {line}: {detail}")]
    ParseError { line: usize, detail: String },

    /// The TOML settings file is malformed.
    #[error("settings parse error: {0}")]
    SettingsParseError(String),

    /// A resource section lacks a required key.
    #[error("resource section [{section}] is missing required key '{key}'")]
    MissingKey { section: String, key: String },

    /// A settings value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading a config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from local Git (git2) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The repository path does not exist or is not a git repo.
    #[error("git repository not found at '{0}'")]
    RepositoryNotFound(String),

    /// The base revision could not be resolved to a tree.
    #[error("git revision not found: {0}")]
    RevisionNotFound(String),

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),
}

// ---------------------------------------------------------------------------
// Transifex CLI errors
// ---------------------------------------------------------------------------

/// Errors from invoking the Transifex `tx` client.
#[derive(Debug, Error)]
pub enum TxError {
    /// The `tx` binary was not found on `$PATH`.
    #[error("tx binary not found: {0}")]
    BinaryNotFound(String),

    /// A `tx` command exited with a non-zero status.
    #[error("tx command failed (exit {exit_code}): {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },

    /// The command did not finish within the configured timeout.
    #[error("tx command timed out after {0:?}")]
    Timeout(Duration),

    /// Generic I/O wrapper.
    #[error("tx I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Notification errors
// ---------------------------------------------------------------------------

/// Errors from the Slack webhook.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The webhook answered with a non-success status.
    #[error("Slack notification failed: {0}")]
    SlackError(String),

    /// HTTP error during notification delivery.
    #[error("notification HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}
