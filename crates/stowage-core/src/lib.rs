//! # Stowage Core
//!
//! Value types for the Stowage OCI registry client.
//!
//! This crate provides the content-addressing and image-model layer shared by
//! everything that talks to a registry:
//!
//! - [`Digest`] - content addresses: compute, parse, verify
//! - [`ImageReference`] - validated registry/repository/tag-or-digest names
//! - [`MediaType`] - OCI and Docker media type constants and predicates
//! - [`Descriptor`] - typed references to stored blobs
//! - [`ImageManifest`] - single-platform image documents
//! - [`ImageIndex`] - multi-architecture fan-out documents
//! - [`ImageConfiguration`] - platform metadata and uncompressed-layer digests
//!
//! Everything here is a plain value: no I/O, no async, no shared state.
//! Construction validates; once built, instances are immutable.
//!
//! ## Example
//!
//! ```rust
//! use stowage_core::{Descriptor, Digest, ImageManifest, ImageReference, MediaType};
//!
//! // Parse and validate an image reference
//! let image: ImageReference = "registry.example.com/library/app:v1.2".parse()?;
//! assert_eq!(image.repository(), "library/app");
//!
//! // Describe a config blob by content address
//! let config_bytes = br#"{"architecture":"amd64","os":"linux"}"#;
//! let config = Descriptor::new(
//!     MediaType::oci_config(),
//!     Digest::from_bytes(config_bytes),
//!     config_bytes.len() as u64,
//! );
//!
//! let manifest = ImageManifest::new(config, Vec::new());
//! assert_eq!(manifest.schema_version, 2);
//! # Ok::<(), stowage_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod descriptor;
pub mod digest;
pub mod error;
pub mod index;
pub mod manifest;
pub mod media;
pub mod reference;


// Re-export main types at crate root
pub use config::{HistoryEntry, ImageConfiguration, Rootfs};
pub use descriptor::{Descriptor, Platform};
pub use digest::Digest;
pub use error::{Error, Result};
pub use index::ImageIndex;
pub use manifest::ImageManifest;
pub use media::MediaType;
pub use reference::{ImageReference, Reference};
