//! # Stowage Registry
//!
//! OCI Distribution API client for pushing and pulling image content.
//!
//! This crate speaks the OCI Distribution Specification to any compatible
//! registry (Docker Registry, Harbor, ECR, GCR, etc.): blob upload and
//! download, manifest and index push/pull, tag listing, and existence
//! probes, with content digests verified at every boundary.
//!
//! ## Features
//!
//! - **OCI Distribution API**: Blobs, manifests, indexes, and tag listing
//! - **Digest Verification**: Every read and write checked against its digest
//! - **Auth Challenges**: Basic and Bearer token negotiation on demand
//! - **Multi-Arch Resolution**: Select one architecture out of an image index
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stowage_registry::{RegistryClient, RegistryConfig, RegistryAuth};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create registry client
//!     let config = RegistryConfig::new("https://registry.example.com")
//!         .with_auth(RegistryAuth::basic("ci-bot", "secret"));
//!
//!     let client = RegistryClient::new(config)?;
//!
//!     // List what the repository holds
//!     let tags = client.get_tags("library/app").await?;
//!     println!("{} tags", tags.tags.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    RegistryClient                           │
//! │  ┌─────────────┐  ┌──────────────┐  ┌───────────────────┐  │
//! │  │  Transport  │  │ Authenticator │  │   LayerUpload     │  │
//! │  │  (HTTP)     │  │ (Challenges)  │  │   (gzip)          │  │
//! │  └─────────────┘  └──────────────┘  └───────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  OCI Registry                                │
//! │     (Docker Registry, Harbor, ECR, GCR, etc.)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod api;
mod auth;
mod challenge;
mod client;
mod config;
mod error;
mod http;
mod layer;

pub use api::{ApiError, TagList};
pub use auth::CredentialResolver;
pub use challenge::{BearerChallenge, Challenge};
pub use client::RegistryClient;
pub use config::{RegistryAuth, RegistryConfig, TlsConfig};
pub use error::RegistryError;
pub use layer::UploadedLayer;
