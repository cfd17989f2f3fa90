//! Local Git repository queries via `git2`.
//!
//! Both queries compare a base revision's tree with the current index and
//! working tree, the same view `git diff <base>` gives. Untracked files are
//! not reported.

use std::path::Path;

use git2::{Diff, DiffFormat, DiffOptions, Repository, Tree};
use tracing::{debug, info, instrument};

use crate::errors::GitError;

/// High-level Git client wrapping a `git2::Repository`.
pub struct GitClient {
    repo: Repository,
}

impl GitClient {
    /// Open the Git repository containing `repo_path`, searching parent
    /// directories like the `git` CLI does.
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Result<Self, GitError> {
        let path = repo_path.as_ref();
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::discover(path)
            .map_err(|_| GitError::RepositoryNotFound(path.display().to_string()))?;
        Ok(Self { repo })
    }

    /// Paths that differ between `base` and the working tree.
    ///
    /// Renamed files are reported under their new path.
    #[instrument(skip(self))]
    pub fn changed_paths(&self, base: &str) -> Result<Vec<String>, GitError> {
        let tree = self.resolve_tree(base)?;
        let mut opts = DiffOptions::new();
        let diff = self.workdir_diff(&tree, &mut opts)?;

        let paths: Vec<String> = diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        debug!(count = paths.len(), "collected changed paths");
        Ok(paths)
    }

    /// Unified patch text for one path between `base` and the working tree.
    ///
    /// Returns an empty string when the path did not change.
    #[instrument(skip(self))]
    pub fn file_diff(&self, base: &str, path: &str) -> Result<String, GitError> {
        let tree = self.resolve_tree(base)?;
        let mut opts = DiffOptions::new();
        opts.pathspec(path).disable_pathspec_match(true);
        let diff = self.workdir_diff(&tree, &mut opts)?;

        let mut patch = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                patch.push(line.origin());
            }
            patch.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        debug!(len = patch.len(), "rendered file diff");
        Ok(patch)
    }

    fn resolve_tree(&self, base: &str) -> Result<Tree<'_>, GitError> {
        let object = self
            .repo
            .revparse_single(base)
            .map_err(|_| GitError::RevisionNotFound(base.to_string()))?;
        Ok(object.peel_to_tree()?)
    }

    fn workdir_diff(&self, tree: &Tree<'_>, opts: &mut DiffOptions) -> Result<Diff<'_>, GitError> {
        let mut diff = self.repo.diff_tree_to_workdir_with_index(Some(tree), Some(opts))?;
        diff.find_similar(None)?;
        Ok(diff)
    }
}
