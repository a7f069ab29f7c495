//! Media types used by the OCI image and distribution specifications.

use serde::{Deserialize, Serialize};

/// A media type string attached to registry content.
///
/// Known OCI and Docker values are provided as constants; arbitrary values
/// are allowed because registries may serve vendor-specific artifact types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(String);

impl MediaType {
    /// OCI image manifest media type.
    pub const OCI_MANIFEST: &'static str = "application/vnd.oci.image.manifest.v1+json";

    /// OCI image index media type.
    pub const OCI_INDEX: &'static str = "application/vnd.oci.image.index.v1+json";

    /// OCI image configuration media type.
    pub const OCI_CONFIG: &'static str = "application/vnd.oci.image.config.v1+json";

    /// OCI gzip-compressed layer media type.
    pub const OCI_LAYER_GZIP: &'static str = "application/vnd.oci.image.layer.v1.tar+gzip";

    /// Docker schema-2 manifest media type (read compatibility).
    pub const DOCKER_MANIFEST: &'static str =
        "application/vnd.docker.distribution.manifest.v2+json";

    /// Docker manifest list media type (read compatibility).
    pub const DOCKER_MANIFEST_LIST: &'static str =
        "application/vnd.docker.distribution.manifest.list.v2+json";

    /// Generic binary content; the `Content-Type` for all blob uploads.
    pub const OCTET_STREAM: &'static str = "application/octet-stream";

    /// Creates a new media type.
    #[must_use]
    pub fn new(media_type: impl Into<String>) -> Self {
        Self(media_type.into())
    }

    /// Returns the media type string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creates the OCI image manifest media type.
    #[must_use]
    pub fn oci_manifest() -> Self {
        Self::new(Self::OCI_MANIFEST)
    }

    /// Creates the OCI image index media type.
    #[must_use]
    pub fn oci_index() -> Self {
        Self::new(Self::OCI_INDEX)
    }

    /// Creates the OCI image configuration media type.
    #[must_use]
    pub fn oci_config() -> Self {
        Self::new(Self::OCI_CONFIG)
    }

    /// Creates the OCI gzip-compressed layer media type.
    #[must_use]
    pub fn oci_layer_gzip() -> Self {
        Self::new(Self::OCI_LAYER_GZIP)
    }

    /// Returns true if this is a single-image manifest type (OCI or Docker).
    #[must_use]
    pub fn is_manifest(&self) -> bool {
        self.0 == Self::OCI_MANIFEST || self.0 == Self::DOCKER_MANIFEST
    }

    /// Returns true if this is a multi-image index type (OCI or Docker).
    #[must_use]
    pub fn is_index(&self) -> bool {
        self.0 == Self::OCI_INDEX || self.0 == Self::DOCKER_MANIFEST_LIST
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MediaType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for MediaType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s))
    }
}

/// `Accept` header value for manifest requests: OCI first, Docker schema-2
/// for registries that only speak the older type.
#[must_use]
pub fn manifest_accept() -> String {
    [MediaType::OCI_MANIFEST, MediaType::DOCKER_MANIFEST].join(", ")
}

/// `Accept` header value for index requests.
#[must_use]
pub fn index_accept() -> String {
    [MediaType::OCI_INDEX, MediaType::DOCKER_MANIFEST_LIST].join(", ")
}
