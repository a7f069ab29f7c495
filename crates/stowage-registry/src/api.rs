//! Wire documents specific to the distribution API.

use serde::{Deserialize, Serialize};

/// Response document of the tag-listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagList {
    /// Repository name, echoed back by the registry.
    pub name: String,

    /// Tags in registry order.
    pub tags: Vec<String>,
}

/// Error envelope registries return on 4xx responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    pub errors: Vec<ApiError>,
}

/// A single entry from a registry error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    /// Machine-readable error code (e.g. `MANIFEST_UNKNOWN`).
    #[serde(default)]
    pub code: String,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,

    /// Extra detail; shape varies by registry.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}
