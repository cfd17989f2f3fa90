//! TOML-based run settings for txpush.
//!
//! Everything a run needs is collected into one [`Settings`] value at
//! startup: file defaults, then environment, then command-line overrides.
//! The Slack webhook URL is a secret and is only ever read from the
//! environment variable named by `slack.webhook_url_env`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

/// File name probed in the repository root when no settings path is given.
pub const DEFAULT_SETTINGS_FILE: &str = "txpush.toml";

/// Environment variable carrying the `since_commit` action input.
pub const SINCE_COMMIT_ENV: &str = "INPUT_SINCE_COMMIT";

// ---------------------------------------------------------------------------
// Top-level settings
// ---------------------------------------------------------------------------

/// Top-level settings for one txpush run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Detect and report, but do not push or notify.
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub git: GitSettings,

    #[serde(default)]
    pub tx: TxSettings,

    #[serde(default)]
    pub slack: SlackSettings,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
            git: GitSettings::default(),
            tx: TxSettings::default(),
            slack: SlackSettings::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

/// Repository location and comparison point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitSettings {
    /// Repository working tree (default `.`).
    #[serde(default = "default_repo_path")]
    pub repo_path: PathBuf,

    /// Base revision to diff the working tree against (default `HEAD~1`).
    #[serde(default = "default_since_commit")]
    pub since_commit: String,
}

fn default_repo_path() -> PathBuf {
    PathBuf::from(".")
}
fn default_since_commit() -> String {
    "HEAD~1".into()
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            repo_path: default_repo_path(),
            since_commit: default_since_commit(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transifex
// ---------------------------------------------------------------------------

/// How to find and invoke the Transifex client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxSettings {
    /// Name or path of the `tx` executable.
    #[serde(default = "default_tx_binary")]
    pub binary: String,

    /// Transifex config, relative to the repository unless absolute.
    #[serde(default = "default_tx_config_path")]
    pub config_path: PathBuf,

    /// Upper bound on a single `tx push`, in seconds.
    #[serde(default = "default_tx_timeout")]
    pub timeout_secs: u64,
}

fn default_tx_binary() -> String {
    "tx".into()
}
fn default_tx_config_path() -> PathBuf {
    PathBuf::from(".tx/config")
}
fn default_tx_timeout() -> u64 {
    300
}

impl Default for TxSettings {
    fn default() -> Self {
        Self {
            binary: default_tx_binary(),
            config_path: default_tx_config_path(),
            timeout_secs: default_tx_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// Slack
// ---------------------------------------------------------------------------

/// Slack incoming-webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackSettings {
    /// Environment variable holding the webhook URL.
    #[serde(default = "default_webhook_env")]
    pub webhook_url_env: String,

    /// Attachment title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Attachment colour bar.
    #[serde(default = "default_color")]
    pub color: String,

    /// Upper bound on the webhook request, in seconds.
    #[serde(default = "default_slack_timeout")]
    pub timeout_secs: u64,

    /// Resolved webhook URL (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub webhook_url: Option<String>,
}

fn default_webhook_env() -> String {
    "SLACK_WEBHOOK_URL".into()
}
fn default_title() -> String {
    ":rocket: Updated translations pushed to Transifex".into()
}
fn default_color() -> String {
    "good".into()
}
fn default_slack_timeout() -> u64 {
    30
}

impl Default for SlackSettings {
    fn default() -> Self {
        Self {
            webhook_url_env: default_webhook_env(),
            title: default_title(),
            color: default_color(),
            timeout_secs: default_slack_timeout(),
            webhook_url: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading, env resolution, validation
// ---------------------------------------------------------------------------

impl Settings {
    /// Load settings from a TOML file.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading settings");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)
            .map_err(|e| ConfigError::SettingsParseError(e.to_string()))?;

        debug!("settings parsed successfully");
        Ok(settings)
    }

    /// Load `path` when given, else `<repo>/txpush.toml` when present, else
    /// defaults.
    pub fn discover(path: Option<&Path>, repo_path: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        let candidate = repo_path.join(DEFAULT_SETTINGS_FILE);
        if candidate.is_file() {
            return Self::load_from_file(candidate);
        }
        debug!("no settings file, using defaults");
        Ok(Self::default())
    }

    /// Resolve the webhook URL and the `since_commit` input from the
    /// environment.
    ///
    /// An unset or empty webhook variable disables notification; it is not
    /// an error.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        self.slack.webhook_url =
            resolve_optional_env(&self.slack.webhook_url_env, "slack.webhook_url_env");

        if let Some(since) = resolve_optional_env(SINCE_COMMIT_ENV, "git.since_commit") {
            self.git.since_commit = since;
        }

        debug!("environment variable resolution complete");
        Ok(())
    }

    /// Validate that all fields are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.git.since_commit.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "git.since_commit".into(),
                detail: "base revision must not be empty".into(),
            });
        }
        if self.tx.binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tx.binary".into(),
                detail: "tx binary must not be empty".into(),
            });
        }
        if self.tx.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tx.timeout_secs".into(),
                detail: "timeout must be > 0".into(),
            });
        }
        if self.slack.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "slack.timeout_secs".into(),
                detail: "timeout must be > 0".into(),
            });
        }
        if let Some(ref url) = self.slack.webhook_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::InvalidValue {
                    field: "slack.webhook_url_env".into(),
                    detail: "webhook URL must start with http:// or https://".into(),
                });
            }
        }

        Ok(())
    }

    /// The Transifex config path, anchored at the repository when relative.
    pub fn tx_config_path(&self) -> PathBuf {
        if self.tx.config_path.is_absolute() {
            self.tx.config_path.clone()
        } else {
            self.git.repo_path.join(&self.tx.config_path)
        }
    }

    /// Whether a Slack message will be sent.
    pub fn notifications_enabled(&self) -> bool {
        self.slack.webhook_url.is_some()
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` when
/// it is set and non-empty.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.trim().is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val.trim().to_string())
        }
        Ok(_) => {
            debug!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            debug!(field, env_name, "env var not set");
            None
        }
    }
}

/// Log a one-line summary of what this run will do.
pub fn log_summary(settings: &Settings) {
    info!(
        repo = %settings.git.repo_path.display(),
        since = %settings.git.since_commit,
        tx_config = %settings.tx_config_path().display(),
        slack = settings.notifications_enabled(),
        dry_run = settings.dry_run,
        "txpush settings"
    );
    if !settings.notifications_enabled() {
        warn!(
            env_name = %settings.slack.webhook_url_env,
            "Slack webhook not configured, notification disabled"
        );
    }
}
