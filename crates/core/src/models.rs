//! Transient values passed between the stages of one run.

use serde::Serialize;

use crate::tx_config::ResourceKey;

/// Whether one resource's source file changed, and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub resource_key: String,
    /// The first changed path containing the resource's `source_file`.
    /// `None` means unchanged.
    pub matched_path: Option<String>,
    /// Raw unified diff of `matched_path`, present only when changed.
    pub diff: Option<String>,
}

impl ChangeReport {
    pub fn unchanged(resource_key: impl Into<String>) -> Self {
        Self { resource_key: resource_key.into(), matched_path: None, diff: None }
    }

    pub fn changed(&self) -> bool {
        self.matched_path.is_some()
    }
}

/// A resource that was pushed, with the lines that changed in its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushResult {
    pub resource_key: String,
    pub key: ResourceKey,
    /// Added and removed lines of the source diff, newline-joined.
    pub changes: String,
}

/// Outcome of a complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushSummary {
    /// Pushed resources, in config order.
    pub pushed: Vec<PushResult>,
    /// Keys of resources whose source file did not change.
    pub skipped: Vec<String>,
    /// Whether a Slack message was sent.
    pub notified: bool,
}
