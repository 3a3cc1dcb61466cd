//! Version discovery across one or more sources.
//!
//! Sources implement [`Discoverer`]. [`versions`] runs them in order and never
//! stops early: every source is queried, every error is collected into one
//! [`AggregateError`], and whatever records were produced are still encoded.

mod error;

pub use error::{AggregateError, DiscoveryError, DiscoveryErrorKind};

use crate::version::VersionRecord;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// A source of version records.
#[async_trait]
pub trait Discoverer: Send + Sync {
    /// Produces the versions currently published by this source.
    ///
    /// A source that fails part way may still return the records it built
    /// before the failure alongside the error.
    async fn discover(&self) -> DiscoveryOutcome;
}

/// Records produced by one [`Discoverer`] call, plus the error that ended it.
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    /// Records built by the source, possibly incomplete if `error` is set.
    pub versions: Vec<VersionRecord>,

    /// The failure that ended discovery, if any.
    pub error: Option<DiscoveryError>,
}

impl DiscoveryOutcome {
    /// A complete result.
    pub fn success(versions: Vec<VersionRecord>) -> Self {
        Self {
            versions,
            error: None,
        }
    }

    /// A failure after `versions` were already built.
    pub fn partial(versions: Vec<VersionRecord>, error: DiscoveryError) -> Self {
        Self {
            versions,
            error: Some(error),
        }
    }

    /// Returns the records, or the error if discovery failed. Partial records
    /// are dropped on failure.
    pub fn into_result(self) -> Result<Vec<VersionRecord>, DiscoveryError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.versions),
        }
    }
}

impl From<Result<Vec<VersionRecord>, DiscoveryError>> for DiscoveryOutcome {
    fn from(result: Result<Vec<VersionRecord>, DiscoveryError>) -> Self {
        match result {
            Ok(versions) => Self::success(versions),
            Err(error) => Self::partial(Vec::new(), error),
        }
    }
}

/// Result of an aggregated discovery run.
///
/// `json` is populated even when `error` is set, since records from sources
/// that succeeded may still be usable.
#[derive(Debug)]
pub struct VersionsOutput {
    /// Encoded JSON array of all discovered records.
    pub json: Vec<u8>,

    /// Every error observed during the run, if any.
    pub error: Option<AggregateError>,
}

impl VersionsOutput {
    /// Returns the encoded records, or the aggregate error if anything failed.
    pub fn into_result(self) -> Result<Vec<u8>, AggregateError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.json),
        }
    }
}

/// Runs every discoverer in order and encodes the combined records as JSON.
///
/// An empty result is encoded as `[]`.
pub async fn versions(discoverers: &[&dyn Discoverer]) -> VersionsOutput {
    let mut records: Vec<VersionRecord> = Vec::new();
    let mut errors = Vec::new();

    for (index, discoverer) in discoverers.iter().enumerate() {
        let outcome = discoverer.discover().await;
        debug!(
            source = index,
            count = outcome.versions.len(),
            "Source discovery complete"
        );
        records.extend(outcome.versions);

        if let Some(e) = outcome.error {
            warn!(source = index, error = %e, "Source discovery failed");
            errors.push(e);
        }
    }

    let json = match serde_json::to_vec(&records) {
        Ok(json) => json,
        Err(e) => {
            errors.push(DiscoveryError::Serialization(e));
            Vec::new()
        }
    };

    info!(
        sources = discoverers.len(),
        versions = records.len(),
        errors = errors.len(),
        "Discovery finished"
    );

    VersionsOutput {
        json,
        error: AggregateError::from_errors(errors),
    }
}
