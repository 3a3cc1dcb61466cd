//! Git manifest discovery configuration.

use std::path::{Path, PathBuf};

/// Configuration for [`GitReleaseFinder`](super::GitReleaseFinder).
///
/// Built with chained `with_*` setters; the last call for a setting wins.
/// Nothing is validated until discovery runs.
#[derive(Debug, Clone, Default)]
pub struct GitConfig {
    /// Repository URL to clone.
    repository: String,
    /// Directory inside the repository to scan, relative to its root.
    subpath: String,
    /// Branch to check out instead of the default branch.
    branch: Option<String>,
    /// Directory temporary clones are created in.
    work_dir: Option<PathBuf>,
}

impl GitConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the repository to clone.
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    /// Sets the repository subpath versions are read from.
    pub fn with_subpath(mut self, subpath: impl Into<String>) -> Self {
        self.subpath = subpath.into();
        self
    }

    /// Sets the branch to read versions from. An empty name means the default branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        self.branch = (!branch.is_empty()).then_some(branch);
        self
    }

    /// Sets the directory temporary clones are created in.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    /// Returns the repository URL.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns the subpath (empty for the repository root).
    pub fn subpath(&self) -> &str {
        &self.subpath
    }

    /// Returns the branch, if any.
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Returns the directory temporary clones are created in, if overridden.
    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }
}
