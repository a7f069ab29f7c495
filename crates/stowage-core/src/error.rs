//! Error types for Stowage core operations.
//!
//! This module defines the error types used throughout the `stowage-core` crate.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Stowage core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Repository name does not match the distribution-spec grammar.
    #[error("Invalid repository name '{name}': {reason}")]
    InvalidRepository {
        /// The rejected repository name.
        name: String,
        /// Reason the name is invalid.
        reason: String,
    },

    /// Tag does not match the distribution-spec grammar.
    #[error("Invalid tag '{tag}': {reason}")]
    InvalidTag {
        /// The rejected tag.
        tag: String,
        /// Reason the tag is invalid.
        reason: String,
    },

    /// Digest string is not a well-formed `algorithm:hex` content address.
    #[error("Invalid digest '{digest}': {reason}")]
    InvalidDigest {
        /// The rejected digest string.
        digest: String,
        /// Reason the digest is invalid.
        reason: String,
    },

    /// Image reference string could not be parsed.
    #[error("Invalid image reference '{reference}': {reason}")]
    InvalidReference {
        /// The rejected reference string.
        reference: String,
        /// Reason the reference is invalid.
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_repository() {
        let err = Error::InvalidRepository {
            name: "Bad/Name".to_string(),
            reason: "uppercase characters are not allowed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid repository name 'Bad/Name': uppercase characters are not allowed"
        );
    }

    #[test]
    fn test_error_display_invalid_tag() {
        let err = Error::InvalidTag {
            tag: ".hidden".to_string(),
            reason: "must start with a word character".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid tag '.hidden': must start with a word character"
        );
    }

    #[test]
    fn test_error_display_invalid_digest() {
        let err = Error::InvalidDigest {
            digest: "md5:abc".to_string(),
            reason: "unsupported algorithm 'md5'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid digest 'md5:abc': unsupported algorithm 'md5'"
        );
    }

    #[test]
    fn test_error_display_invalid_reference() {
        let err = Error::InvalidReference {
            reference: "app".to_string(),
            reason: "missing registry host".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid image reference 'app': missing registry host"
        );
    }
}
