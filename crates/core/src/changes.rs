//! Change detection for Transifex resources.
//!
//! The changed-path listing is fetched once per run and every resource is
//! decided against that cached list. A resource counts as changed when any
//! changed path *contains* its `source_file`. The match is deliberately
//! loose: `en.json` matches `locales/en.json`, and also `locales/men.json`.

use tracing::{debug, info};

use crate::errors::GitError;
use crate::git::GitClient;
use crate::models::ChangeReport;
use crate::tx_config::ResourceEntry;

/// Version-control queries needed to detect and describe changes.
pub trait ChangeSource {
    /// Paths that differ between `base` and the working tree.
    fn changed_paths(&self, base: &str) -> Result<Vec<String>, GitError>;

    /// Unified diff of one path between `base` and the working tree.
    fn file_diff(&self, base: &str, path: &str) -> Result<String, GitError>;
}

impl ChangeSource for GitClient {
    fn changed_paths(&self, base: &str) -> Result<Vec<String>, GitError> {
        GitClient::changed_paths(self, base)
    }

    fn file_diff(&self, base: &str, path: &str) -> Result<String, GitError> {
        GitClient::file_diff(self, base, path)
    }
}

/// Decides which resources changed relative to a base revision.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    base: String,
    changed_paths: Vec<String>,
}

impl ChangeDetector {
    /// List the changed paths once and keep them for every later decision.
    pub fn new<S: ChangeSource + ?Sized>(source: &S, base: impl Into<String>) -> Result<Self, GitError> {
        let base = base.into();
        let changed_paths = source.changed_paths(&base)?;
        info!(base = %base, count = changed_paths.len(), "listed changed files");
        Ok(Self { base, changed_paths })
    }

    /// Build a detector over an already known path list.
    pub fn from_paths(base: impl Into<String>, changed_paths: Vec<String>) -> Self {
        Self { base: base.into(), changed_paths }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn changed_paths(&self) -> &[String] {
        &self.changed_paths
    }

    /// The first changed path containing `source_file`, if any.
    pub fn matched_path(&self, source_file: &str) -> Option<&str> {
        if source_file.is_empty() {
            return None;
        }
        self.changed_paths
            .iter()
            .map(String::as_str)
            .find(|path| path.contains(source_file))
    }

    /// Whether the entry's source file changed.
    pub fn is_changed(&self, entry: &ResourceEntry) -> bool {
        self.matched_path(&entry.source_file).is_some()
    }

    /// Decide one entry from the cached listing. No diff is fetched.
    pub fn decide(&self, entry: &ResourceEntry) -> ChangeReport {
        match self.matched_path(&entry.source_file) {
            Some(path) => {
                info!(resource = %entry.parsed.resource, path, "source file changed");
                ChangeReport {
                    resource_key: entry.key.clone(),
                    matched_path: Some(path.to_string()),
                    diff: None,
                }
            }
            None => {
                info!(resource = %entry.parsed.resource, "source file unchanged");
                ChangeReport::unchanged(&entry.key)
            }
        }
    }

    /// Fill in the diff of the report's matched path. Unchanged reports are
    /// left alone.
    pub fn attach_diff<S: ChangeSource + ?Sized>(
        &self,
        source: &S,
        report: &mut ChangeReport,
    ) -> Result<(), GitError> {
        if let Some(path) = report.matched_path.as_deref() {
            let diff = source.file_diff(&self.base, path)?;
            debug!(len = diff.len(), "fetched source diff");
            report.diff = Some(diff);
        }
        Ok(())
    }

    /// Decide one entry and, when changed, fetch the diff of the matched path.
    pub fn inspect<S: ChangeSource + ?Sized>(
        &self,
        source: &S,
        entry: &ResourceEntry,
    ) -> Result<ChangeReport, GitError> {
        let mut report = self.decide(entry);
        self.attach_diff(source, &mut report)?;
        Ok(report)
    }
}
