//! GitHub API access for release listing.

use crate::discovery::DiscoveryError;
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::{Octocrab, Page};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Timeout applied to anonymous clients, both per connection phase and to the
/// whole listing.
pub(crate) const ANONYMOUS_TIMEOUT: Duration = Duration::from_secs(30);

/// Releases requested per page.
const RELEASES_PER_PAGE: u8 = 100;

/// The subset of a GitHub release needed for discovery.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReleaseSummary {
    /// Git tag the release points at.
    pub tag_name: String,

    /// Whether GitHub flags the release as a pre-release.
    #[serde(default)]
    pub prerelease: bool,
}

#[derive(Serialize)]
struct ListParams {
    per_page: u8,
}

/// Builds the API client.
///
/// Without a token the client is anonymous and every request is bounded by
/// [`ANONYMOUS_TIMEOUT`]. Automatic retries are disabled.
pub(crate) fn build_client(
    token: Option<&str>,
    api_url: Option<&str>,
) -> Result<Octocrab, DiscoveryError> {
    let mut builder = Octocrab::builder().add_retry_config(RetryConfig::None);

    if let Some(api_url) = api_url {
        builder = builder.base_uri(api_url).map_err(|e| {
            DiscoveryError::invalid_configuration(format!("invalid API URL '{api_url}': {e}"))
        })?;
    }

    builder = match token {
        Some(token) => builder.personal_token(token.to_string()),
        None => builder
            .set_connect_timeout(Some(ANONYMOUS_TIMEOUT))
            .set_read_timeout(Some(ANONYMOUS_TIMEOUT))
            .set_write_timeout(Some(ANONYMOUS_TIMEOUT)),
    };

    Ok(builder.build()?)
}

/// Lists every release of `owner/name`, following pagination.
///
/// Returns `None` when GitHub reports the repository (or its releases) as
/// not found.
pub(crate) async fn list_releases(
    octocrab: &Octocrab,
    owner: &str,
    name: &str,
) -> Result<Option<Vec<ReleaseSummary>>, octocrab::Error> {
    let route = format!("/repos/{owner}/{name}/releases");
    let params = ListParams {
        per_page: RELEASES_PER_PAGE,
    };

    let first_page: Page<ReleaseSummary> = match octocrab.get(route, Some(&params)).await {
        Ok(page) => page,
        Err(e) if is_not_found(&e) => {
            warn!(owner, name, "API returned 404, repository or releases not found");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let releases = octocrab.all_pages(first_page).await?;
    debug!(owner, name, count = releases.len(), "Fetched releases");
    Ok(Some(releases))
}

/// Checks whether an API error is a 404 response.
fn is_not_found(error: &octocrab::Error) -> bool {
    match error {
        octocrab::Error::GitHub { source, .. } => source.status_code.as_u16() == 404,
        _ => false,
    }
}
