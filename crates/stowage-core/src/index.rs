//! OCI image indexes (multi-architecture fan-out).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::Descriptor;
use crate::manifest::SCHEMA_VERSION;
use crate::media::MediaType;

/// A multi-architecture image: an ordered list of per-platform manifest
/// descriptors.
///
/// Registries do not enforce that platforms are unique within an index, so
/// selection must be deterministic: [`ImageIndex::find_architecture`] always
/// returns the first matching entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageIndex {
    /// Schema version (always 2).
    pub schema_version: u32,

    /// Media type of this index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,

    /// Per-platform manifest descriptors, in publisher order.
    pub manifests: Vec<Descriptor>,

    /// Optional annotations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,
}

impl ImageIndex {
    /// Creates an OCI index over the given manifest descriptors.
    #[must_use]
    pub fn new(manifests: Vec<Descriptor>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            media_type: Some(MediaType::oci_index()),
            manifests,
            annotations: None,
        }
    }

    /// Adds an annotation to the index.
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Returns the media type to declare on the wire, defaulting to the OCI
    /// index type when the document does not carry one.
    #[must_use]
    pub fn declared_media_type(&self) -> MediaType {
        self.media_type.clone().unwrap_or_else(MediaType::oci_index)
    }

    /// Returns the first entry whose platform architecture matches.
    ///
    /// Entries without platform information are skipped.
    #[must_use]
    pub fn find_architecture(&self, architecture: &str) -> Option<&Descriptor> {
        self.manifests.iter().find(|entry| {
            entry
                .platform
                .as_ref()
                .is_some_and(|platform| platform.architecture == architecture)
        })
    }
}
