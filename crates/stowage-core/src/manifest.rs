//! OCI image manifests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::Descriptor;
use crate::media::MediaType;

/// Schema version carried by every manifest and index document.
pub const SCHEMA_VERSION: u32 = 2;

/// A single-platform image: one config blob plus an ordered list of layers.
///
/// Layer order is significant; layers are applied bottom to top as
/// filesystem diffs, and the config's `diff_ids` list must match it entry
/// for entry.
///
/// # Examples
///
/// ```
/// use stowage_core::{Descriptor, Digest, ImageManifest, MediaType};
///
/// let config = Descriptor::new(MediaType::oci_config(), Digest::from_bytes(b"{}"), 2);
/// let manifest = ImageManifest::new(config, Vec::new());
/// assert_eq!(manifest.schema_version, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageManifest {
    /// Schema version (always 2).
    pub schema_version: u32,

    /// Media type of this manifest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,

    /// Image configuration descriptor.
    pub config: Descriptor,

    /// Ordered layer descriptors, bottom-most first.
    pub layers: Vec<Descriptor>,

    /// Optional annotations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,
}

impl ImageManifest {
    /// Creates an OCI manifest for the given config and layers.
    #[must_use]
    pub fn new(config: Descriptor, layers: Vec<Descriptor>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            media_type: Some(MediaType::oci_manifest()),
            config,
            layers,
            annotations: None,
        }
    }

    /// Adds an annotation to the manifest.
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Returns the media type to declare on the wire, defaulting to the OCI
    /// manifest type when the document does not carry one.
    #[must_use]
    pub fn declared_media_type(&self) -> MediaType {
        self.media_type
            .clone()
            .unwrap_or_else(MediaType::oci_manifest)
    }
}
