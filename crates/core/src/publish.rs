//! Pushing changed resources to Transifex.

use tracing::{info, instrument};

use crate::errors::{CoreError, TxError};
use crate::models::{ChangeReport, PushResult};
use crate::tx::TxClient;
use crate::tx_config::{ResourceEntry, ResourceKey};

/// Uploads the source strings of one resource.
#[allow(async_fn_in_trait)]
pub trait ResourcePusher {
    /// Push and return the tool's captured output.
    async fn push(&self, key: &ResourceKey) -> Result<String, TxError>;
}

impl ResourcePusher for TxClient {
    async fn push(&self, key: &ResourceKey) -> Result<String, TxError> {
        TxClient::push(self, key).await
    }
}

/// Keep only added and removed lines of a unified diff.
///
/// File headers (`diff --git`, `index`, `---`, `+++`), hunk headers and
/// context lines are dropped. Inside a hunk every `+`/`-` line is content,
/// so a removed `---` YAML marker (`----`) or an added `++x` (`+++x`) is
/// kept.
pub fn summarize_diff(diff: &str) -> String {
    let mut in_header = false;
    let mut seen_hunk = false;
    let mut kept = Vec::new();

    for line in diff.lines() {
        if line.starts_with("diff ") {
            in_header = true;
            continue;
        }
        if line.starts_with("@@") {
            in_header = false;
            seen_hunk = true;
            continue;
        }
        if in_header || (!seen_hunk && (line.starts_with("--- ") || line.starts_with("+++ "))) {
            continue;
        }
        if line.starts_with('+') || line.starts_with('-') {
            kept.push(line);
        }
    }

    kept.join("\n")
}

/// Pushes resources one at a time and records what changed.
pub struct Publisher<'a, P> {
    pusher: &'a P,
    dry_run: bool,
}

impl<'a, P: ResourcePusher> Publisher<'a, P> {
    pub fn new(pusher: &'a P, dry_run: bool) -> Self {
        Self { pusher, dry_run }
    }

    /// Push `entry` if its report says it changed. Returns whether it was
    /// pushed (or would have been, in dry-run mode).
    ///
    /// A push failure is returned as-is; the caller is expected to abort.
    #[instrument(skip(self, entry, report), fields(resource = %entry.parsed.resource))]
    pub async fn push(&self, entry: &ResourceEntry, report: &ChangeReport) -> Result<bool, CoreError> {
        if !report.changed() {
            return Ok(false);
        }

        if self.dry_run {
            info!(push_target = %entry.parsed.push_target(), "dry run, not pushing");
        } else {
            info!(
                project = %entry.parsed.project,
                "pushing translations for resource"
            );
            let stdout = self.pusher.push(&entry.parsed).await?;
            info!("Transifex push output:\n{}", stdout.trim_end());
        }
        Ok(true)
    }

    /// Build the result for a pushed entry from its report's diff.
    pub fn record(&self, entry: &ResourceEntry, report: &ChangeReport) -> PushResult {
        PushResult {
            resource_key: entry.key.clone(),
            key: entry.parsed.clone(),
            changes: summarize_diff(report.diff.as_deref().unwrap_or_default()),
        }
    }
}
