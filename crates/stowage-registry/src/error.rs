//! Error types for registry operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to connect to the registry.
    #[error("Failed to connect to registry at {url}: {source}")]
    ConnectionFailed {
        /// Registry URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Request could not be sent or its response could not be read.
    #[error("Request to {url} failed: {source}")]
    RequestFailed {
        /// Request URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Response status differed from what the operation expected.
    #[error("Unexpected status {status} from {url}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
        /// Raw response body.
        body: String,
    },

    /// Structured error response from the registry.
    #[error("Registry rejected the request (HTTP {status}): {}", summarize(.errors))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Decoded error entries from the response envelope.
        errors: Vec<ApiError>,
    },

    /// Locally computed digest disagrees with a server-reported one.
    #[error("Digest mismatch for {context}: expected {expected}, got {actual}")]
    DigestMismatch {
        /// What was being verified.
        context: String,
        /// Locally computed digest.
        expected: String,
        /// Digest reported by the registry.
        actual: String,
    },

    /// Authentication failed.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Error message.
        message: String,
    },

    /// Authentication challenge header could not be parsed.
    #[error("Invalid authentication challenge '{header}': {reason}")]
    InvalidChallenge {
        /// Raw header value.
        header: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Token endpoint did not produce a usable token.
    #[error("Token exchange with {realm} failed: {message}")]
    TokenExchangeFailed {
        /// Token endpoint URL.
        realm: String,
        /// Error message.
        message: String,
    },

    /// A required response header was absent.
    #[error("Response from {url} is missing the {name} header")]
    MissingHeader {
        /// Header name.
        name: String,
        /// Request URL.
        url: String,
    },

    /// A manifest request returned an image index instead.
    #[error("{repository}:{reference} is an image index, not a single manifest")]
    ManifestIsIndex {
        /// Repository name.
        repository: String,
        /// The requested reference.
        reference: String,
    },

    /// No entry in an image index matched the requested architecture.
    #[error("No suitable image for architecture '{architecture}' in {repository}:{reference}")]
    NoMatchingArchitecture {
        /// The requested architecture.
        architecture: String,
        /// Repository name.
        repository: String,
        /// The index reference that was searched.
        reference: String,
    },

    /// Invalid URL.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// URL string.
        url: String,
    },

    /// Invalid repository name, tag, or digest.
    #[error("Invalid reference: {source}")]
    InvalidReference {
        /// Underlying validation error.
        #[from]
        source: stowage_core::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {source}")]
    JsonError {
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error at {path}: {source}")]
    IoError {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Layer compression failed.
    #[error("Failed to compress layer: {source}")]
    CompressionFailed {
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid TLS material in the client configuration.
    #[error("Invalid TLS configuration: {message}")]
    InvalidTls {
        /// Error message.
        message: String,
    },
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map_or_else(|| "unknown".to_string(), ToString::to_string);
        if err.is_connect() {
            Self::ConnectionFailed { url, source: err }
        } else {
            Self::RequestFailed { url, source: err }
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError { source: err }
    }
}

fn summarize(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return "no error detail provided".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{}: {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_digest_mismatch() {
        let err = RegistryError::DigestMismatch {
            context: "blob library/app".to_string(),
            expected: "sha256:aaa".to_string(),
            actual: "sha256:bbb".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Digest mismatch for blob library/app: expected sha256:aaa, got sha256:bbb"
        );
    }

    #[test]
    fn test_error_display_api() {
        let err = RegistryError::Api {
            status: 404,
            errors: vec![ApiError {
                code: "MANIFEST_UNKNOWN".to_string(),
                message: "manifest unknown".to_string(),
                detail: None,
            }],
        };
        assert_eq!(
            err.to_string(),
            "Registry rejected the request (HTTP 404): MANIFEST_UNKNOWN: manifest unknown"
        );
    }

    #[test]
    fn test_error_display_api_without_detail() {
        let err = RegistryError::Api {
            status: 400,
            errors: Vec::new(),
        };
        assert!(err.to_string().contains("no error detail provided"));
    }

    #[test]
    fn test_error_display_missing_header() {
        let err = RegistryError::MissingHeader {
            name: "Location".to_string(),
            url: "http://registry.test/v2/app/blobs/uploads/".to_string(),
        };
        assert!(err.to_string().contains("missing the Location header"));
    }

    #[test]
    fn test_error_display_no_matching_architecture() {
        let err = RegistryError::NoMatchingArchitecture {
            architecture: "riscv64".to_string(),
            repository: "library/app".to_string(),
            reference: "multi".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No suitable image for architecture 'riscv64' in library/app:multi"
        );
    }

    #[test]
    fn test_invalid_reference_wraps_core_error() {
        let core_err = stowage_core::reference::validate_repository("Bad").unwrap_err();
        let err: RegistryError = core_err.into();
        assert!(matches!(err, RegistryError::InvalidReference { .. }));
        assert!(err.to_string().contains("Invalid reference"));
    }
}
