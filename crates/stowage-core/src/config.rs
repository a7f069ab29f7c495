//! OCI image configuration documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::Digest;

/// The only `rootfs.type` value defined by the image spec.
const ROOTFS_TYPE_LAYERS: &str = "layers";

/// Image configuration: platform metadata, provenance, and the uncompressed
/// layer digests.
///
/// `rootfs.diff_ids` holds the digest of each layer's *uncompressed* tar
/// stream, one per manifest layer and in the same order. Those are distinct
/// from the manifest's layer digests, which address the compressed blobs as
/// stored; a valid image keeps both lists in lockstep, though the client
/// does not enforce that pairing itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfiguration {
    /// When the image was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// Name and/or email of the image author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// CPU architecture the image targets (e.g. `amd64`).
    pub architecture: String,

    /// Operating system the image targets (e.g. `linux`).
    pub os: String,

    /// Root filesystem composition.
    pub rootfs: Rootfs,

    /// How each layer came to be, oldest first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
}

impl ImageConfiguration {
    /// Creates a configuration for the given platform with no layers.
    #[must_use]
    pub fn new(architecture: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            created: None,
            author: None,
            architecture: architecture.into(),
            os: os.into(),
            rootfs: Rootfs::new(Vec::new()),
            history: None,
        }
    }

    /// Sets the creation timestamp.
    #[must_use]
    pub const fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Appends an uncompressed-layer digest to `rootfs.diff_ids`.
    ///
    /// Call once per manifest layer, in manifest layer order.
    #[must_use]
    pub fn with_layer_diff_id(mut self, diff_id: Digest) -> Self {
        self.rootfs.diff_ids.push(diff_id);
        self
    }

    /// Appends a history entry.
    #[must_use]
    pub fn with_history(mut self, entry: HistoryEntry) -> Self {
        self.history.get_or_insert_with(Vec::new).push(entry);
        self
    }
}

/// The `rootfs` section of an image configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rootfs {
    /// Always `layers`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Digests of the uncompressed layer tars, in manifest layer order.
    pub diff_ids: Vec<Digest>,
}

impl Rootfs {
    /// Creates a `layers`-typed rootfs over the given diff IDs.
    #[must_use]
    pub fn new(diff_ids: Vec<Digest>) -> Self {
        Self {
            kind: ROOTFS_TYPE_LAYERS.to_string(),
            diff_ids,
        }
    }
}

/// One entry in an image's build history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the layer was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// Author of the layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Command that produced the layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    /// Free-form comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// True if the entry does not correspond to a layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_layer: Option<bool>,
}
