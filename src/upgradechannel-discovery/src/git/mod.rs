//! Version discovery from JSON manifests stored in a git repository.
//!
//! The repository is shallow-cloned into a temporary directory which is
//! removed before discovery returns. Every file under the configured subpath
//! whose name ends in `json` is decoded as a [`VersionRecord`]; files that do
//! not decode are skipped, files that cannot be read fail the whole run.

mod clone;
mod config;

pub use config::GitConfig;

use crate::discovery::{Discoverer, DiscoveryError, DiscoveryOutcome};
use crate::version::VersionRecord;
use async_trait::async_trait;
use bstr::ByteSlice;
use clone::{redact_url, shallow_clone};
use std::ffi::OsStr;
use std::path::{Component, Path};
use tempfile::TempDir;
use tracing::{debug, info, info_span, warn, Instrument};
use walkdir::WalkDir;

/// Suffix identifying manifest files.
///
/// Deliberately matched against the whole file name rather than an
/// extension, so `versionsjson` qualifies as well as `v1.json`.
const MANIFEST_SUFFIX: &str = "json";

/// Prefix of temporary clone directories.
const CLONE_DIR_PREFIX: &str = "rf";

/// Discovers versions from manifests checked into a git repository.
#[derive(Debug, Clone)]
pub struct GitReleaseFinder {
    config: GitConfig,
}

impl GitReleaseFinder {
    /// Creates a finder. Configuration problems are reported at discovery time.
    pub fn new(config: GitConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GitConfig {
        &self.config
    }

    fn validate(&self) -> Result<(), DiscoveryError> {
        if self.config.repository().trim().is_empty() {
            return Err(DiscoveryError::invalid_configuration(
                "no git repository configured",
            ));
        }

        if let Some(branch) = self.config.branch() {
            gix_validate::reference::name_partial(branch.as_bytes().as_bstr()).map_err(|e| {
                DiscoveryError::invalid_configuration(format!(
                    "invalid branch name '{branch}': {e}"
                ))
            })?;
        }

        if Path::new(self.config.subpath())
            .components()
            .any(|c| c == Component::ParentDir)
        {
            return Err(DiscoveryError::invalid_configuration(format!(
                "subpath must stay inside the repository: '{}'",
                self.config.subpath()
            )));
        }

        Ok(())
    }

    fn create_clone_dir(&self) -> Result<TempDir, DiscoveryError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(CLONE_DIR_PREFIX);

        let result = match self.config.work_dir() {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        };

        result.map_err(|e| DiscoveryError::CloneFailed {
            repository: redact_url(self.config.repository()),
            message: format!("Failed to create temp directory: {e}"),
        })
    }

    async fn clone_and_collect(&self, clone_dir: &Path) -> Result<Vec<VersionRecord>, DiscoveryError> {
        shallow_clone(self.config.repository(), self.config.branch(), clone_dir).await?;
        info!(path = %clone_dir.display(), "Clone done");

        let subpath = self.config.subpath().trim_start_matches('/');
        collect_manifests(clone_dir, &clone_dir.join(subpath))
    }

    async fn find_versions(&self) -> Result<Vec<VersionRecord>, DiscoveryError> {
        self.validate()?;

        let span = info_span!(
            "git_discovery",
            repository = %redact_url(self.config.repository()),
            branch = self.config.branch().unwrap_or_default(),
            subpath = self.config.subpath()
        );

        async {
            let clone_dir = self.create_clone_dir()?;
            info!("Cloning repository");

            let result = self.clone_and_collect(clone_dir.path()).await;

            let clone_path = clone_dir.path().to_path_buf();
            if let Err(e) = clone_dir.close() {
                warn!(path = %clone_path.display(), error = %e, "Failed to remove clone directory");
            }

            if let Ok(versions) = &result {
                info!(count = versions.len(), "Manifest discovery complete");
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl Discoverer for GitReleaseFinder {
    async fn discover(&self) -> DiscoveryOutcome {
        self.find_versions().await.into()
    }
}

/// Checks whether a file name marks a manifest.
fn is_manifest_name(name: &OsStr) -> bool {
    name.to_string_lossy().ends_with(MANIFEST_SUFFIX)
}

/// Walks `root` in lexical order and decodes every manifest below it.
///
/// Entries that cannot be visited (including a missing `root`) are skipped.
/// Paths in errors and logs are shown relative to `clone_dir`.
fn collect_manifests(clone_dir: &Path, root: &Path) -> Result<Vec<VersionRecord>, DiscoveryError> {
    let mut versions = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if entry.file_type().is_dir() || !is_manifest_name(entry.file_name()) {
            continue;
        }

        let path = entry.path();
        let display_path = path.strip_prefix(clone_dir).unwrap_or(path);
        info!(path = %display_path.display(), "Manifest found");

        let content = std::fs::read(path).map_err(|source| DiscoveryError::ManifestRead {
            path: display_path.to_path_buf(),
            source,
        })?;

        match serde_json::from_slice::<VersionRecord>(&content) {
            Ok(version) => versions.push(version),
            Err(e) => {
                warn!(path = %display_path.display(), error = %e, "Skipping invalid manifest");
            }
        }
    }

    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveryErrorKind;
    use std::fs;

    fn manifest(name: &str) -> String {
        format!(
            r#"{{"metadata":{{"name":"{name}"}},"spec":{{"type":"container","version":"{name}","metadata":{{"upgradeImage":"registry.example.com/os:{name}"}}}}}}"#
        )
    }

    fn names(versions: &[VersionRecord]) -> Vec<&str> {
        versions.iter().map(VersionRecord::name).collect()
    }

    #[test]
    fn test_is_manifest_name() {
        assert!(is_manifest_name(OsStr::new("v1.json")));
        assert!(is_manifest_name(OsStr::new("versionsjson")));
        assert!(!is_manifest_name(OsStr::new("v1.yaml")));
        assert!(!is_manifest_name(OsStr::new("v1.json.bak")));
        assert!(!is_manifest_name(OsStr::new("v1.JSON")));
    }

    #[test]
    fn test_collect_skips_invalid_manifests() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.json"), manifest("v1")).unwrap();
        fs::write(temp.path().join("b.json"), "{ not json").unwrap();
        fs::write(temp.path().join("c.json"), "[1, 2]").unwrap();
        fs::write(temp.path().join("d.json"), manifest("v2")).unwrap();
        fs::write(temp.path().join("e.json"), "[]").unwrap();
        fs::write(temp.path().join("f.json"), r#"{"metadata": [], "spec": {}}"#).unwrap();
        fs::write(temp.path().join("README.md"), manifest("ignored")).unwrap();

        let versions = collect_manifests(temp.path(), temp.path()).unwrap();

        assert_eq!(names(&versions), ["v1", "v2"]);
        assert!(versions.iter().all(|v| !v.name().is_empty()));
    }

    #[test]
    fn test_collect_walks_nested_directories_in_lexical_order() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("b/inner")).unwrap();
        fs::create_dir_all(temp.path().join("a")).unwrap();
        fs::write(temp.path().join("b/inner/z.json"), manifest("b-inner-z")).unwrap();
        fs::write(temp.path().join("b/a.json"), manifest("b-a")).unwrap();
        fs::write(temp.path().join("a/x.json"), manifest("a-x")).unwrap();
        fs::write(temp.path().join("c.json"), manifest("c")).unwrap();

        let versions = collect_manifests(temp.path(), temp.path()).unwrap();

        assert_eq!(names(&versions), ["a-x", "b-a", "b-inner-z", "c"]);
    }

    #[test]
    fn test_collect_limits_to_subpath() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("root.json"), manifest("root")).unwrap();
        fs::write(temp.path().join("sub/nested.json"), manifest("nested")).unwrap();

        let versions = collect_manifests(temp.path(), &temp.path().join("sub")).unwrap();

        assert_eq!(names(&versions), ["nested"]);
    }

    #[test]
    fn test_collect_missing_root_yields_nothing() {
        let temp = tempfile::tempdir().unwrap();

        let versions = collect_manifests(temp.path(), &temp.path().join("missing")).unwrap();

        assert!(versions.is_empty());
    }

    #[test]
    fn test_collect_ignores_directories_with_manifest_suffix() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("versions.json")).unwrap();
        fs::write(temp.path().join("versions.json/v1.json"), manifest("v1")).unwrap();

        let versions = collect_manifests(temp.path(), temp.path()).unwrap();

        assert_eq!(names(&versions), ["v1"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_fails_on_unreadable_manifest() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.json"), manifest("v1")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone"), temp.path().join("b.json")).unwrap();

        let err = collect_manifests(temp.path(), temp.path()).unwrap_err();

        assert_eq!(err.kind(), DiscoveryErrorKind::FileReadFailure);
        assert!(err.to_string().contains("b.json"));
    }

    #[tokio::test]
    async fn test_discover_without_repository_fails() {
        let err = GitReleaseFinder::new(GitConfig::new())
            .discover()
            .await
            .into_result()
            .unwrap_err();

        assert_eq!(err.kind(), DiscoveryErrorKind::InvalidConfiguration);
    }

    #[tokio::test]
    async fn test_discover_rejects_invalid_branch() {
        let finder = GitReleaseFinder::new(
            GitConfig::new()
                .with_repository("https://example.com/repo.git")
                .with_branch("bad..branch"),
        );

        let err = finder.discover().await.into_result().unwrap_err();

        assert_eq!(err.kind(), DiscoveryErrorKind::InvalidConfiguration);
    }

    #[tokio::test]
    async fn test_discover_rejects_escaping_subpath() {
        let finder = GitReleaseFinder::new(
            GitConfig::new()
                .with_repository("https://example.com/repo.git")
                .with_subpath("../outside"),
        );

        let err = finder.discover().await.into_result().unwrap_err();

        assert_eq!(err.kind(), DiscoveryErrorKind::InvalidConfiguration);
    }
}
