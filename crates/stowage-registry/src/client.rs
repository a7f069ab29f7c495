//! OCI Distribution API client.
//!
//! This module provides the main client interface for pushing and pulling
//! content-addressed image artifacts against a registry endpoint.

use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use stowage_core::media::{index_accept, manifest_accept};
use stowage_core::reference::validate_repository;
use stowage_core::{Descriptor, Digest, ImageIndex, ImageManifest, MediaType, Reference};
use url::Url;

use crate::api::TagList;
use crate::auth::Authenticator;
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::http::{RegistryRequest, RegistryResponse, Transport};

/// Response header carrying the server-computed digest.
const DOCKER_CONTENT_DIGEST: &str = "Docker-Content-Digest";

/// Client for a single OCI-compatible registry endpoint.
///
/// All operations validate repository names and references before any
/// network traffic, verify content digests on reads and writes, and go
/// through the challenge-retry handshake when the registry demands
/// authentication.
#[derive(Debug)]
pub struct RegistryClient {
    config: RegistryConfig,
    endpoint: Url,
    transport: Transport,
}

impl RegistryClient {
    /// Creates a new registry client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL does not parse or the HTTP
    /// client cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use stowage_registry::{RegistryClient, RegistryConfig};
    ///
    /// let config = RegistryConfig::new("https://registry.example.com");
    /// let client = RegistryClient::new(config)?;
    /// # Ok::<(), stowage_registry::RegistryError>(())
    /// ```
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let endpoint = Url::parse(&config.url).map_err(|_| RegistryError::InvalidUrl {
            url: config.url.clone(),
        })?;
        let http = Self::build_http_client(&config)?;
        let authenticator =
            Authenticator::new(config.auth.clone(), config.credential_resolver.clone());

        Ok(Self {
            config,
            endpoint,
            transport: Transport::new(http, authenticator),
        })
    }

    /// Returns the registry configuration.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Checks that the endpoint speaks the distribution API.
    ///
    /// The `/v2/` probe is also the cheapest way to trigger an
    /// authentication challenge and verify credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be reached or answers with
    /// anything but 200.
    pub async fn check_api(&self) -> Result<(), RegistryError> {
        let url = self.v2_url("")?;
        let request = RegistryRequest::new(Method::GET, url);
        self.transport.execute(request, StatusCode::OK, &[]).await?;
        Ok(())
    }

    /// Checks whether a blob exists in the repository.
    ///
    /// 200 means present, 404 means absent; every other status is an error
    /// rather than being conflated with absence.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid repository name or an unexpected
    /// response status.
    pub async fn blob_exists(
        &self,
        repository: &str,
        digest: &Digest,
    ) -> Result<bool, RegistryError> {
        validate_repository(repository)?;
        let url = self.v2_url(&format!("{repository}/blobs/{digest}"))?;
        let request = RegistryRequest::new(Method::HEAD, url);

        let response = self.transport.dispatch(&request).await?;
        match response.status {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(RegistryError::UnexpectedStatus {
                status: status.as_u16(),
                url: request.url().to_string(),
                body: String::from_utf8_lossy(&response.body).into_owned(),
            }),
        }
    }

    /// Fetches a blob and verifies it hashes back to the requested digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is absent, the registry answers with an
    /// unexpected status, or the fetched bytes do not match the digest they
    /// were requested under.
    pub async fn get_blob(
        &self,
        repository: &str,
        digest: &Digest,
    ) -> Result<Vec<u8>, RegistryError> {
        validate_repository(repository)?;
        let url = self.v2_url(&format!("{repository}/blobs/{digest}"))?;
        let request =
            RegistryRequest::new(Method::GET, url).header(ACCEPT, MediaType::OCTET_STREAM);

        let response = self
            .transport
            .execute(request, StatusCode::OK, &[StatusCode::NOT_FOUND])
            .await?;

        if !digest.matches(&response.body) {
            return Err(RegistryError::DigestMismatch {
                context: format!("blob {repository}@{digest}"),
                expected: digest.to_string(),
                actual: Digest::from_bytes(&response.body).to_string(),
            });
        }
        Ok(response.body)
    }

    /// Uploads a blob using the two-request upload protocol.
    ///
    /// A POST opens an upload session and yields an opaque `Location`; the
    /// locally computed digest is appended to it as a query parameter and
    /// the raw bytes are PUT there. The body is always sent as
    /// `application/octet-stream`; `media_type` only describes the content
    /// in the returned descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails its expected status, the
    /// `Location` header is missing, or the server reports a digest that
    /// differs from the locally computed one.
    pub async fn put_blob(
        &self,
        repository: &str,
        media_type: MediaType,
        bytes: &[u8],
    ) -> Result<Descriptor, RegistryError> {
        validate_repository(repository)?;
        let digest = Digest::from_bytes(bytes);

        let start_url = self.v2_url(&format!("{repository}/blobs/uploads/"))?;
        let request = RegistryRequest::new(Method::POST, start_url.clone());
        let response = self
            .transport
            .execute(request, StatusCode::ACCEPTED, &[])
            .await?;

        let location = response
            .headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| RegistryError::MissingHeader {
                name: "Location".to_string(),
                url: start_url.to_string(),
            })?;

        // The location may be relative or absolute and may already carry
        // query parameters; the digest is appended, never overwriting.
        let mut upload_url =
            self.endpoint
                .join(location)
                .map_err(|_| RegistryError::InvalidUrl {
                    url: location.to_string(),
                })?;
        upload_url
            .query_pairs_mut()
            .append_pair("digest", &digest.to_string());

        let request = RegistryRequest::new(Method::PUT, upload_url)
            .header(CONTENT_TYPE, MediaType::OCTET_STREAM)
            .body(bytes.to_vec());
        let response = self
            .transport
            .execute(request, StatusCode::CREATED, &[])
            .await?;

        Self::verify_reported_digest(&response, &digest, &format!("blob upload {repository}"))?;
        tracing::info!(repository, digest = %digest, size = bytes.len(), "uploaded blob");

        Ok(Descriptor::new(media_type, digest, bytes.len() as u64))
    }

    /// Serializes a value to JSON and uploads it as a blob.
    ///
    /// This is how configuration objects reach the registry: they are plain
    /// blobs whose media type only lives in the descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the upload fails as in
    /// [`Self::put_blob`].
    pub async fn put_blob_json<T: Serialize>(
        &self,
        repository: &str,
        media_type: MediaType,
        value: &T,
    ) -> Result<Descriptor, RegistryError> {
        let bytes = serde_json::to_vec(value)?;
        self.put_blob(repository, media_type, &bytes).await
    }

    /// Fetches a single-image manifest and its descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ManifestIsIndex`] if the reference turns out
    /// to name an image index, and the usual not-found/status/decode errors
    /// otherwise.
    pub async fn get_manifest(
        &self,
        repository: &str,
        reference: &str,
    ) -> Result<(ImageManifest, Descriptor), RegistryError> {
        validate_repository(repository)?;
        let reference = Reference::parse(reference)?;
        self.fetch_manifest(repository, &reference).await
    }

    /// Fetches an image index.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is absent, the registry answers
    /// with an unexpected status, or the body does not decode as an index.
    pub async fn get_index(
        &self,
        repository: &str,
        reference: &str,
    ) -> Result<ImageIndex, RegistryError> {
        validate_repository(repository)?;
        let reference = Reference::parse(reference)?;
        self.fetch_index(repository, &reference).await
    }

    /// Resolves a reference to the manifest for one architecture.
    ///
    /// The single-manifest fetch is attempted first since most references
    /// are not multi-architecture; only when the object turns out to be an
    /// index is it fetched as one and scanned for the first entry whose
    /// platform architecture matches. Content negotiation is not trusted for
    /// this, as registries disagree about it. An index entry that itself
    /// points at another index is not followed; the nested fetch fails with
    /// [`RegistryError::ManifestIsIndex`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoMatchingArchitecture`] when the index has
    /// no entry for `architecture`, and the underlying fetch errors
    /// otherwise.
    pub async fn get_image_manifest(
        &self,
        repository: &str,
        reference: &str,
        architecture: &str,
    ) -> Result<(ImageManifest, Descriptor), RegistryError> {
        validate_repository(repository)?;
        let reference = Reference::parse(reference)?;

        match self.fetch_manifest(repository, &reference).await {
            Ok(found) => Ok(found),
            Err(RegistryError::ManifestIsIndex { .. }) => {
                tracing::debug!(
                    repository,
                    reference = %reference,
                    "reference is an index, selecting by architecture"
                );
                let index = self.fetch_index(repository, &reference).await?;
                let entry = index.find_architecture(architecture).ok_or_else(|| {
                    RegistryError::NoMatchingArchitecture {
                        architecture: architecture.to_string(),
                        repository: repository.to_string(),
                        reference: reference.to_string(),
                    }
                })?;
                let target = Reference::Digest(entry.digest.clone());
                self.fetch_manifest(repository, &target).await
            }
            Err(err) => Err(err),
        }
    }

    /// Pushes a manifest, optionally tagging it.
    ///
    /// With `reference` set to `None` the manifest is pushed purely
    /// content-addressed: the URL reference is its own digest and no tag is
    /// created.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails, the registry does not answer
    /// 201, or it reports a digest differing from the locally computed one.
    pub async fn put_manifest(
        &self,
        repository: &str,
        reference: Option<&str>,
        manifest: &ImageManifest,
    ) -> Result<Descriptor, RegistryError> {
        validate_repository(repository)?;
        let body = serde_json::to_vec(manifest)?;
        let digest = Digest::from_bytes(&body);
        let reference = match reference {
            Some(reference) => Reference::parse(reference)?,
            None => Reference::Digest(digest.clone()),
        };

        self.push_document(
            repository,
            &reference,
            body,
            manifest.declared_media_type(),
            digest,
        )
        .await
    }

    /// Pushes an image index, optionally tagging it.
    ///
    /// Same contract as [`Self::put_manifest`], with the index media type on
    /// the wire.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`Self::put_manifest`].
    pub async fn put_index(
        &self,
        repository: &str,
        reference: Option<&str>,
        index: &ImageIndex,
    ) -> Result<Descriptor, RegistryError> {
        validate_repository(repository)?;
        let body = serde_json::to_vec(index)?;
        let digest = Digest::from_bytes(&body);
        let reference = match reference {
            Some(reference) => Reference::parse(reference)?,
            None => Reference::Digest(digest.clone()),
        };

        self.push_document(
            repository,
            &reference,
            body,
            index.declared_media_type(),
            digest,
        )
        .await
    }

    /// Checks whether a manifest exists for the given reference.
    ///
    /// Same three-way contract as [`Self::blob_exists`].
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid repository or reference, or an
    /// unexpected response status.
    pub async fn manifest_exists(
        &self,
        repository: &str,
        reference: &str,
    ) -> Result<bool, RegistryError> {
        validate_repository(repository)?;
        let reference = Reference::parse(reference)?;
        let url = self.v2_url(&format!("{repository}/manifests/{reference}"))?;
        let request = RegistryRequest::new(Method::HEAD, url).header(ACCEPT, manifest_accept());

        let response = self.transport.dispatch(&request).await?;
        match response.status {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(RegistryError::UnexpectedStatus {
                status: status.as_u16(),
                url: request.url().to_string(),
                body: String::from_utf8_lossy(&response.body).into_owned(),
            }),
        }
    }

    /// Lists the tags of a repository.
    ///
    /// An unknown repository or one without tags fails with the registry's
    /// error rather than returning an empty list, so callers can tell "no
    /// tags" from "tagged with nothing"; observed registry behavior, kept
    /// as-is.
    ///
    /// # Errors
    ///
    /// Returns the decoded registry error for 404, and the usual status and
    /// decode errors otherwise.
    pub async fn get_tags(&self, repository: &str) -> Result<TagList, RegistryError> {
        validate_repository(repository)?;
        let url = self.v2_url(&format!("{repository}/tags/list"))?;
        let request = RegistryRequest::new(Method::GET, url);

        let response = self
            .transport
            .execute(request, StatusCode::OK, &[StatusCode::NOT_FOUND])
            .await?;
        serde_json::from_slice(&response.body).map_err(Into::into)
    }

    /// Fetches a manifest with manifest `Accept` types and fails if the
    /// response declares itself an index.
    async fn fetch_manifest(
        &self,
        repository: &str,
        reference: &Reference,
    ) -> Result<(ImageManifest, Descriptor), RegistryError> {
        let url = self.v2_url(&format!("{repository}/manifests/{reference}"))?;
        let request = RegistryRequest::new(Method::GET, url).header(ACCEPT, manifest_accept());
        let response = self
            .transport
            .execute(request, StatusCode::OK, &[StatusCode::NOT_FOUND])
            .await?;

        if let Some(content_type) = response
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if MediaType::new(content_type).is_index() {
                return Err(RegistryError::ManifestIsIndex {
                    repository: repository.to_string(),
                    reference: reference.to_string(),
                });
            }
        }

        let manifest: ImageManifest = serde_json::from_slice(&response.body)?;
        let digest = Digest::from_bytes(&response.body);
        Self::verify_reported_digest(
            &response,
            &digest,
            &format!("manifest {repository}:{reference}"),
        )?;
        let descriptor = Descriptor::new(
            manifest.declared_media_type(),
            digest,
            response.body.len() as u64,
        );
        Ok((manifest, descriptor))
    }

    /// Fetches an index with index `Accept` types.
    async fn fetch_index(
        &self,
        repository: &str,
        reference: &Reference,
    ) -> Result<ImageIndex, RegistryError> {
        let url = self.v2_url(&format!("{repository}/manifests/{reference}"))?;
        let request = RegistryRequest::new(Method::GET, url).header(ACCEPT, index_accept());
        let response = self
            .transport
            .execute(request, StatusCode::OK, &[StatusCode::NOT_FOUND])
            .await?;
        serde_json::from_slice(&response.body).map_err(Into::into)
    }

    /// PUTs an encoded manifest or index under the given reference.
    async fn push_document(
        &self,
        repository: &str,
        reference: &Reference,
        body: Vec<u8>,
        media_type: MediaType,
        digest: Digest,
    ) -> Result<Descriptor, RegistryError> {
        let url = self.v2_url(&format!("{repository}/manifests/{reference}"))?;
        let size = body.len() as u64;
        let request = RegistryRequest::new(Method::PUT, url)
            .header(CONTENT_TYPE, media_type.as_str())
            .body(body);

        let response = self
            .transport
            .execute(request, StatusCode::CREATED, &[])
            .await?;
        Self::verify_reported_digest(
            &response,
            &digest,
            &format!("manifest {repository}:{reference}"),
        )?;
        tracing::info!(repository, reference = %reference, digest = %digest, "pushed manifest");

        Ok(Descriptor::new(media_type, digest, size))
    }

    /// Builds a `/v2/` API URL on the configured endpoint.
    fn v2_url(&self, tail: &str) -> Result<Url, RegistryError> {
        let raw = format!("{}/v2/{tail}", self.endpoint.as_str().trim_end_matches('/'));
        Url::parse(&raw).map_err(|_| RegistryError::InvalidUrl { url: raw })
    }

    /// Fails if the server reported a digest that differs from the locally
    /// computed one. A missing header is tolerated; a wrong one never is.
    fn verify_reported_digest(
        response: &RegistryResponse,
        expected: &Digest,
        context: &str,
    ) -> Result<(), RegistryError> {
        if let Some(reported) = response
            .headers
            .get(DOCKER_CONTENT_DIGEST)
            .and_then(|v| v.to_str().ok())
        {
            if reported != expected.to_string() {
                return Err(RegistryError::DigestMismatch {
                    context: context.to_string(),
                    expected: expected.to_string(),
                    actual: reported.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Builds the HTTP client with proper configuration.
    fn build_http_client(config: &RegistryConfig) -> Result<reqwest::Client, RegistryError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent);

        if let Some(ref tls) = config.tls {
            if tls.insecure_skip_verify {
                builder = builder.danger_accept_invalid_certs(true);
            }

            if let Some(ref ca_cert) = tls.ca_cert {
                let cert_pem = std::fs::read(ca_cert).map_err(|e| RegistryError::IoError {
                    path: ca_cert.clone(),
                    source: e,
                })?;
                let cert = reqwest::Certificate::from_pem(&cert_pem).map_err(|e| {
                    RegistryError::InvalidTls {
                        message: format!("invalid CA certificate: {e}"),
                    }
                })?;
                builder = builder.add_root_certificate(cert);
            }

            if let (Some(ref cert_path), Some(ref key_path)) = (&tls.client_cert, &tls.client_key)
            {
                let mut cert_pem = std::fs::read(cert_path).map_err(|e| RegistryError::IoError {
                    path: cert_path.clone(),
                    source: e,
                })?;
                let key_pem = std::fs::read(key_path).map_err(|e| RegistryError::IoError {
                    path: key_path.clone(),
                    source: e,
                })?;
                cert_pem.extend_from_slice(&key_pem);

                let identity = reqwest::Identity::from_pem(&cert_pem).map_err(|e| {
                    RegistryError::InvalidTls {
                        message: format!("invalid client certificate: {e}"),
                    }
                })?;
                builder = builder.identity(identity);
            }
        }

        builder
            .build()
            .map_err(|e| RegistryError::ConnectionFailed {
                url: config.url.clone(),
                source: e,
            })
    }
}
