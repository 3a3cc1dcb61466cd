//! Discovery error types.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering versions.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Structurally invalid configuration, detected before any I/O.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// The in-flight request was cancelled.
    #[error("Request to {repository} was cancelled")]
    Cancelled { repository: String },

    /// The release listing did not finish within its time limit.
    #[error("Request to {repository} timed out after {timeout:?}")]
    Timeout {
        repository: String,
        timeout: std::time::Duration,
    },

    /// Clone failed.
    #[error("Failed to clone repository '{repository}': {message}")]
    CloneFailed { repository: String, message: String },

    /// A manifest file exists but could not be read.
    #[error("Failed to read manifest '{}': {source}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The discovered versions could not be encoded.
    #[error("Failed to serialize versions: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Broad classification of a [`DiscoveryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryErrorKind {
    /// Malformed input; never retried.
    InvalidConfiguration,
    /// Network, transport or clone failure reaching the upstream source.
    SourceUnavailable,
    /// A manifest could not be read.
    FileReadFailure,
    /// The result set could not be encoded.
    SerializationFailure,
}

impl DiscoveryError {
    /// Creates a [`DiscoveryError::InvalidConfiguration`] error.
    pub(crate) fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> DiscoveryErrorKind {
        match self {
            Self::InvalidConfiguration { .. } => DiscoveryErrorKind::InvalidConfiguration,
            Self::GitHubError(_)
            | Self::Cancelled { .. }
            | Self::Timeout { .. }
            | Self::CloneFailed { .. } => DiscoveryErrorKind::SourceUnavailable,
            Self::ManifestRead { .. } => DiscoveryErrorKind::FileReadFailure,
            Self::Serialization(_) => DiscoveryErrorKind::SerializationFailure,
        }
    }
}

/// Every error observed during one aggregated discovery run.
///
/// Never empty: an aggregate is only built once at least one error occurred.
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<DiscoveryError>,
}

impl AggregateError {
    /// Builds an aggregate from collected errors, or `None` if there are none.
    pub fn from_errors(errors: Vec<DiscoveryError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// Returns the collected errors in the order they occurred.
    pub fn errors(&self) -> &[DiscoveryError] {
        &self.errors
    }

    /// Number of collected errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if no errors were collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.errors.as_slice() {
            return write!(f, "1 error occurred:\n\t* {single}");
        }

        write!(f, "{} errors occurred:", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n\t* {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .first()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
