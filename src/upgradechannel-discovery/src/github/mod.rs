//! Version discovery from GitHub releases.
//!
//! Every release of the configured repository becomes one container
//! [`VersionRecord`]:
//!
//! - `version` = version prefix + tag + version suffix
//! - `name` = name prefix + version + name suffix
//! - `upgradeImage` = base image + `:` + version
//!
//! Pre-releases are skipped unless enabled.

mod client;
mod config;

pub use config::GithubConfig;

use crate::discovery::{Discoverer, DiscoveryError, DiscoveryOutcome};
use crate::version::{VersionRecord, UPGRADE_IMAGE_KEY};
use async_trait::async_trait;
use client::{build_client, list_releases, ReleaseSummary, ANONYMOUS_TIMEOUT};
use octocrab::Octocrab;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, info_span, Instrument};

/// Discovers versions from the releases of a GitHub repository.
pub struct GithubReleaseFinder {
    api: Octocrab,
    config: GithubConfig,
}

impl GithubReleaseFinder {
    /// Builds a finder and its API client.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] if the API client cannot be built. A missing
    /// or malformed repository is only reported by [`Discoverer::discover`].
    pub fn new(config: GithubConfig) -> Result<Self, DiscoveryError> {
        let api = build_client(config.token(), config.api_url())?;
        Ok(Self { api, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    /// Time limit for the whole listing.
    fn listing_timeout(&self) -> Option<Duration> {
        match self.config.token() {
            Some(_) => self.config.request_timeout(),
            None => Some(self.config.request_timeout().unwrap_or(ANONYMOUS_TIMEOUT)),
        }
    }

    async fn fetch_releases(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<Vec<ReleaseSummary>>, DiscoveryError> {
        let request = async {
            let listing = list_releases(&self.api, owner, name);
            let result = match self.listing_timeout() {
                Some(timeout) => match tokio::time::timeout(timeout, listing).await {
                    Ok(result) => result,
                    Err(_) => {
                        return Err(DiscoveryError::Timeout {
                            repository: self.config.repository().to_string(),
                            timeout,
                        })
                    }
                },
                None => listing.await,
            };
            result.map_err(DiscoveryError::from)
        };

        match self.config.cancellation() {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(DiscoveryError::Cancelled {
                    repository: self.config.repository().to_string(),
                }),
                result = request => result,
            },
            None => request.await,
        }
    }

    async fn find_versions(&self) -> Result<Vec<VersionRecord>, DiscoveryError> {
        let (owner, name) = parse_slug(self.config.repository())?;
        let span = info_span!("github_discovery", repository = %self.config.repository());

        async {
            info!("Listing releases");

            let Some(releases) = self.fetch_releases(owner, name).await? else {
                return Ok(Vec::new());
            };

            let versions: Vec<VersionRecord> = releases
                .iter()
                .filter(|release| {
                    let keep = self.config.pre_releases() || !release.prerelease;
                    if !keep {
                        debug!(tag = %release.tag_name, "Skipping pre-release");
                    }
                    keep
                })
                .map(|release| release_version(&self.config, &release.tag_name))
                .collect();

            info!(
                releases = releases.len(),
                versions = versions.len(),
                "Release discovery complete"
            );
            Ok(versions)
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl Discoverer for GithubReleaseFinder {
    async fn discover(&self) -> DiscoveryOutcome {
        self.find_versions().await.into()
    }
}

/// Splits an "owner/name" slug into its two non-empty parts.
fn parse_slug(slug: &str) -> Result<(&str, &str), DiscoveryError> {
    let mut parts = slug.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
            Ok((owner, name))
        }
        _ => Err(DiscoveryError::invalid_configuration(format!(
            "invalid slug format, it should be 'owner/name': '{slug}'"
        ))),
    }
}

/// Builds the record for a release tag.
fn release_version(config: &GithubConfig, tag: &str) -> VersionRecord {
    let version = format!(
        "{}{}{}",
        config.version_prefix(),
        tag,
        config.version_suffix()
    );
    let name = format!(
        "{}{}{}",
        config.version_name_prefix(),
        version,
        config.version_name_suffix()
    );

    let mut metadata = Map::new();
    metadata.insert(
        UPGRADE_IMAGE_KEY.to_string(),
        Value::String(format!("{}:{}", config.base_image(), version)),
    );

    VersionRecord::container(name, version, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveryErrorKind;

    #[test]
    fn test_parse_slug() {
        assert_eq!(parse_slug("acme/widget").unwrap(), ("acme", "widget"));
    }

    #[test]
    fn test_parse_slug_rejects_malformed() {
        for slug in ["", "acme", "/widget", "acme/", "/", "a/b/c", "acme//widget"] {
            let err = parse_slug(slug).unwrap_err();
            assert_eq!(err.kind(), DiscoveryErrorKind::InvalidConfiguration, "{slug}");
        }
    }

    #[tokio::test]
    async fn test_listing_timeout_defaults() {
        let anonymous = GithubReleaseFinder::new(GithubConfig::new()).unwrap();
        assert_eq!(anonymous.listing_timeout(), Some(ANONYMOUS_TIMEOUT));

        let authenticated =
            GithubReleaseFinder::new(GithubConfig::new().with_token("secret")).unwrap();
        assert_eq!(authenticated.listing_timeout(), None);

        let configured = GithubReleaseFinder::new(
            GithubConfig::new()
                .with_token("secret")
                .with_request_timeout(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(configured.listing_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_release_version_plain() {
        let config = GithubConfig::new().with_base_image("reg.example.com/widget");
        let record = release_version(&config, "v1.2.3");

        assert_eq!(record.name(), "v1.2.3");
        assert_eq!(record.version(), "v1.2.3");
        assert_eq!(record.spec.version_type, "container");
        assert_eq!(
            record.upgrade_image(),
            Some("reg.example.com/widget:v1.2.3")
        );
    }

    #[test]
    fn test_release_version_decorated() {
        let config = GithubConfig::new()
            .with_base_image("reg.example.com/widget")
            .with_version_name_prefix("zap")
            .with_version_name_suffix("zof")
            .with_version_prefix("foo")
            .with_version_suffix("bar");
        let record = release_version(&config, "v1.2.3");

        assert_eq!(record.name(), "zapfoov1.2.3barzof");
        assert_eq!(record.version(), "foov1.2.3bar");
        assert_eq!(
            record.upgrade_image(),
            Some("reg.example.com/widget:foov1.2.3bar")
        );
    }

    #[test]
    fn test_release_version_is_plain_concatenation() {
        let cases = [
            ("", "", "", "", ""),
            ("p", "", "", "", "1.0"),
            ("", "s", "", "", "1.0"),
            ("", "", "vp", "", "1.0"),
            ("", "", "", "vs", "1.0"),
            ("p-", "-s", "v", "-rc", "2.0"),
        ];

        for (name_prefix, name_suffix, version_prefix, version_suffix, tag) in cases {
            let config = GithubConfig::new()
                .with_base_image("img")
                .with_version_name_prefix(name_prefix)
                .with_version_name_suffix(name_suffix)
                .with_version_prefix(version_prefix)
                .with_version_suffix(version_suffix);
            let record = release_version(&config, tag);

            let version = format!("{version_prefix}{tag}{version_suffix}");
            assert_eq!(record.version(), version);
            assert_eq!(record.name(), format!("{name_prefix}{version}{name_suffix}"));
            assert_eq!(record.upgrade_image(), Some(format!("img:{version}").as_str()));
        }
    }
}
