//! OCI content descriptors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::media::MediaType;

/// A reference to stored content: its type, content address, and size.
///
/// Descriptors are how manifests point at config and layer blobs, and how
/// indexes point at per-platform manifests. The digest is the content
/// address; it must equal the digest independently computable from the
/// referenced bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the referenced content.
    pub media_type: MediaType,

    /// Digest of the referenced content.
    pub digest: Digest,

    /// Size in bytes of the referenced content.
    pub size: u64,

    /// Optional alternative fetch locations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,

    /// Optional annotations (key-value metadata).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,

    /// Platform the referenced content targets; set on index entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

impl Descriptor {
    /// Creates a new descriptor.
    ///
    /// # Examples
    ///
    /// ```
    /// use stowage_core::{Descriptor, Digest, MediaType};
    ///
    /// let data = b"layer bytes";
    /// let descriptor = Descriptor::new(
    ///     MediaType::oci_layer_gzip(),
    ///     Digest::from_bytes(data),
    ///     data.len() as u64,
    /// );
    /// assert_eq!(descriptor.size, 11);
    /// ```
    #[must_use]
    pub const fn new(media_type: MediaType, digest: Digest, size: u64) -> Self {
        Self {
            media_type,
            digest,
            size,
            urls: None,
            annotations: None,
            platform: None,
        }
    }

    /// Adds an annotation to the descriptor.
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Sets the target platform; used when the descriptor is an index entry.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }
}

/// The platform an index entry targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// CPU architecture (e.g. `amd64`, `arm64`).
    pub architecture: String,

    /// Operating system (e.g. `linux`).
    pub os: String,
}

impl Platform {
    /// Creates a new platform.
    #[must_use]
    pub fn new(architecture: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            architecture: architecture.into(),
            os: os.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> Descriptor {
        let data = b"content";
        Descriptor::new(
            MediaType::oci_layer_gzip(),
            Digest::from_bytes(data),
            data.len() as u64,
        )
    }

    #[test]
    fn test_descriptor_new() {
        let descriptor = descriptor();
        assert_eq!(descriptor.size, 7);
        assert_eq!(descriptor.digest.algorithm(), "sha256");
        assert!(descriptor.platform.is_none());
    }

    #[test]
    fn test_descriptor_with_annotation() {
        let descriptor = descriptor().with_annotation("org.opencontainers.image.title", "app");

        let annotations = descriptor.annotations.as_ref().unwrap();
        assert_eq!(
            annotations.get("org.opencontainers.image.title"),
            Some(&"app".to_string())
        );
    }

    #[test]
    fn test_descriptor_with_platform() {
        let descriptor = descriptor().with_platform(Platform::new("arm64", "linux"));
        let platform = descriptor.platform.unwrap();
        assert_eq!(platform.architecture, "arm64");
        assert_eq!(platform.os, "linux");
    }

    #[test]
    fn test_descriptor_serialization_uses_camel_case() {
        let json = serde_json::to_string(&descriptor()).unwrap();
        assert!(json.contains("\"mediaType\""));
        assert!(json.contains("\"digest\":\"sha256:"));
        assert!(json.contains("\"size\":7"));
        // Unset optional fields stay off the wire.
        assert!(!json.contains("annotations"));
        assert!(!json.contains("platform"));
    }

    #[test]
    fn test_descriptor_deserialization_from_registry_payload() {
        let json = r#"{
            "mediaType": "application/vnd.oci.image.manifest.v1+json",
            "digest": "sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08",
            "size": 428,
            "platform": {"architecture": "amd64", "os": "linux"}
        }"#;

        let descriptor: Descriptor = serde_json::from_str(json).unwrap();
        assert!(descriptor.media_type.is_manifest());
        assert_eq!(descriptor.platform.unwrap().architecture, "amd64");
    }
}
