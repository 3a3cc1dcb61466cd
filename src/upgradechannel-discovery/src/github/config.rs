//! GitHub release discovery configuration.

use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Configuration for [`GithubReleaseFinder`](super::GithubReleaseFinder).
///
/// Built with chained `with_*` setters; the last call for a setting wins.
/// Nothing is validated until discovery runs.
#[derive(Clone, Default)]
pub struct GithubConfig {
    /// Repository slug in "owner/name" format.
    repository: String,
    /// Token used to authenticate API requests.
    token: Option<String>,
    /// Prefix added to each record name.
    version_name_prefix: String,
    /// Suffix appended to each record name.
    version_name_suffix: String,
    /// Prefix added to each release tag.
    version_prefix: String,
    /// Suffix appended to each release tag.
    version_suffix: String,
    /// Image the version is appended to as a tag.
    base_image: String,
    /// Whether releases flagged as pre-releases are included.
    pre_releases: bool,
    /// Alternative API endpoint, e.g. a GitHub Enterprise instance.
    api_url: Option<String>,
    /// Token aborting the in-flight release listing when cancelled.
    cancellation: Option<CancellationToken>,
    /// Upper bound on the whole release listing, all pages included.
    request_timeout: Option<Duration>,
}

impl GithubConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the repository ("owner/name") to scan releases of.
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    /// Sets the token used to authenticate requests. An empty token means anonymous access.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    /// Sets a prefix for the record names.
    pub fn with_version_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.version_name_prefix = prefix.into();
        self
    }

    /// Sets a suffix for the record names.
    pub fn with_version_name_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.version_name_suffix = suffix.into();
        self
    }

    /// Sets a prefix for the retrieved versions.
    pub fn with_version_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.version_prefix = prefix.into();
        self
    }

    /// Sets a suffix for the retrieved versions.
    pub fn with_version_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.version_suffix = suffix.into();
        self
    }

    /// Sets the base image the `upgradeImage` metadata is built from.
    pub fn with_base_image(mut self, base_image: impl Into<String>) -> Self {
        self.base_image = base_image.into();
        self
    }

    /// Includes or excludes pre-releases.
    pub fn with_pre_releases(mut self, pre_releases: bool) -> Self {
        self.pre_releases = pre_releases;
        self
    }

    /// Sets the API base URL. Defaults to the public GitHub API.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into();
        self.api_url = (!api_url.is_empty()).then_some(api_url);
        self
    }

    /// Sets a token that cancels discovery when triggered.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Limits how long the whole release listing may take.
    ///
    /// Anonymous clients default to 30 seconds; authenticated clients are
    /// unbounded unless this is set.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Returns the repository slug.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns the authentication token, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns the record name prefix.
    pub fn version_name_prefix(&self) -> &str {
        &self.version_name_prefix
    }

    /// Returns the record name suffix.
    pub fn version_name_suffix(&self) -> &str {
        &self.version_name_suffix
    }

    /// Returns the version prefix.
    pub fn version_prefix(&self) -> &str {
        &self.version_prefix
    }

    /// Returns the version suffix.
    pub fn version_suffix(&self) -> &str {
        &self.version_suffix
    }

    /// Returns the base image.
    pub fn base_image(&self) -> &str {
        &self.base_image
    }

    /// Returns whether pre-releases are included.
    pub fn pre_releases(&self) -> bool {
        self.pre_releases
    }

    /// Returns the API base URL override, if any.
    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref()
    }

    /// Returns the cancellation token, if any.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    /// Returns the configured listing timeout, if any.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("repository", &self.repository)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("version_name_prefix", &self.version_name_prefix)
            .field("version_name_suffix", &self.version_name_suffix)
            .field("version_prefix", &self.version_prefix)
            .field("version_suffix", &self.version_suffix)
            .field("base_image", &self.base_image)
            .field("pre_releases", &self.pre_releases)
            .field("api_url", &self.api_url)
            .field("cancellable", &self.cancellation.is_some())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
