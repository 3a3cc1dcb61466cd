//! Version records produced by discovery.
//!
//! A [`VersionRecord`] serializes to the shape consumed by the upgrade channel:
//!
//! ```json
//! {"metadata":{"name":"v1.2.3"},"spec":{"type":"container","version":"v1.2.3","metadata":{"upgradeImage":"reg.example.com/widget:v1.2.3"}}}
//! ```
//!
//! Decoding is lenient: unknown fields are ignored and missing or `null`
//! fields fall back to empty values, so full resource manifests (with
//! `apiVersion`, `kind`, `status`, ...) can be checked into a repository as is.
//! The record and its `metadata`/`spec` sections must still be JSON objects.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Version type emitted for container based upgrades.
pub const CONTAINER_VERSION_TYPE: &str = "container";

/// Metadata key holding the image to upgrade to.
pub const UPGRADE_IMAGE_KEY: &str = "upgradeImage";

/// A single discovered version.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VersionRecord {
    /// Object metadata (only the name is relevant).
    pub metadata: RecordMetadata,

    /// Version details.
    pub spec: VersionSpec,
}

/// Identifying metadata of a [`VersionRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Record name, expected to be unique within one discovery run.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Version details of a [`VersionRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionSpec {
    /// Kind of version, e.g. [`CONTAINER_VERSION_TYPE`].
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub version_type: String,

    /// Upstream version string, possibly decorated with a prefix/suffix.
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,

    /// Free-form metadata handed to the consumer.
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Map<String, Value>,
}

impl VersionRecord {
    /// Creates a container version record.
    pub fn container(
        name: impl Into<String>,
        version: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            metadata: RecordMetadata { name: name.into() },
            spec: VersionSpec {
                version_type: CONTAINER_VERSION_TYPE.to_string(),
                version: version.into(),
                metadata,
            },
        }
    }

    /// Returns the record name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Returns the version string.
    pub fn version(&self) -> &str {
        &self.spec.version
    }

    /// Returns the upgrade image, if the metadata carries one as a string.
    pub fn upgrade_image(&self) -> Option<&str> {
        self.spec.metadata.get(UPGRADE_IMAGE_KEY)?.as_str()
    }
}

impl<'de> Deserialize<'de> for VersionRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut object = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self {
            metadata: object_field(&mut object, "metadata")?,
            spec: object_field(&mut object, "spec")?,
        })
    }
}

/// Decodes `key` of `object`, which must be an object, `null` or absent.
fn object_field<T, E>(object: &mut Map<String, Value>, key: &str) -> Result<T, E>
where
    T: Default + DeserializeOwned,
    E: serde::de::Error,
{
    match object.remove(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value @ Value::Object(_)) => T::deserialize(value).map_err(E::custom),
        Some(_) => Err(E::custom(format!("`{key}` must be a JSON object"))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
