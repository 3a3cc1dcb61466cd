//! Shallow cloning through the `git` executable.

use crate::discovery::DiscoveryError;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;
use url::Url;

/// Clones `repository` with depth 1 into `path`, checking out `branch` if set.
pub(crate) async fn shallow_clone(
    repository: &str,
    branch: Option<&str>,
    path: &Path,
) -> Result<(), DiscoveryError> {
    debug!(repository = %redact_url(repository), ?branch, "Cloning repository");

    let mut args = vec!["clone", "--depth", "1"];
    if let Some(branch) = branch {
        args.extend(["--branch", branch]);
    }
    args.extend(["--", repository, "."]);

    let output = Command::new("git")
        .args(&args)
        .current_dir(path)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| DiscoveryError::CloneFailed {
            repository: redact_url(repository),
            message: format!("Failed to execute git clone: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiscoveryError::CloneFailed {
            repository: redact_url(repository),
            message: format!("git clone failed: {}", stderr.trim()),
        });
    }

    Ok(())
}

/// Strips credentials from a repository URL for display.
///
/// Values that are not URLs (e.g. `git@host:owner/repo.git`) are returned unchanged.
pub(crate) fn redact_url(repository: &str) -> String {
    match Url::parse(repository) {
        Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
            let _ = url.set_password(None);
            let _ = url.set_username("");
            url.to_string()
        }
        _ => repository.to_string(),
    }
}
