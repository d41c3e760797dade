//! Version control integration
//!
//! Incremental builds ask the VCS which schema files changed since the last
//! published baseline. Only git is supported.

use std::path::{Path, PathBuf};

use git2::{DiffOptions, Repository};
use tracing::debug;

use crate::error::Result;

/// Source of the modified-file set for incremental builds
pub trait VcsProvider {
    /// Files changed since the published baseline. An empty list means
    /// "no signal"; callers fall back to a full build.
    fn modified_files(&self) -> Result<Vec<PathBuf>>;
}

/// Git-backed [`VcsProvider`].
///
/// Reports every file differing between the baseline revision and the
/// working tree (committed, staged, unstaged, and untracked changes).
pub struct GitVcs {
    root: PathBuf,
    baseline: String,
    extension: String,
}

impl GitVcs {
    pub fn new(root: impl Into<PathBuf>, baseline: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            baseline: baseline.into(),
            extension: extension.into(),
        }
    }

    /// Repository root this provider queries
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl VcsProvider for GitVcs {
    fn modified_files(&self) -> Result<Vec<PathBuf>> {
        let repo = Repository::open(&self.root)?;
        let baseline = repo.revparse_single(&self.baseline)?;
        let tree = baseline.peel_to_tree()?;

        let mut opts = DiffOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);

        let diff = repo.diff_tree_to_workdir_with_index(Some(&tree), Some(&mut opts))?;
        let workdir = repo.workdir().unwrap_or(self.root.as_path()).to_path_buf();

        let mut files: Vec<PathBuf> = diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()).map(Path::to_path_buf))
            .filter(|path| path.extension().map(|e| e == self.extension.as_str()).unwrap_or(false))
            .map(|path| workdir.join(path))
            .collect();
        files.sort();
        files.dedup();

        debug!(baseline = %self.baseline, count = files.len(), "modified schema files");
        Ok(files)
    }
}
