#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod discovery;
pub mod git;
pub mod github;
pub mod version;

pub use discovery::{
    versions, AggregateError, Discoverer, DiscoveryError, DiscoveryErrorKind, DiscoveryOutcome,
    VersionsOutput,
};
pub use git::{GitConfig, GitReleaseFinder};
pub use github::{GithubConfig, GithubReleaseFinder};
pub use version::{
    RecordMetadata, VersionRecord, VersionSpec, CONTAINER_VERSION_TYPE, UPGRADE_IMAGE_KEY,
};
