//! Content digest computation and validation.
//!
//! Every blob stored by a registry is addressed by the digest of its exact
//! byte content. This module provides the [`Digest`] value type: computing a
//! digest from bytes, parsing and validating the `algorithm:hex` string form,
//! and comparing locally computed digests against server-reported ones.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest as _, Sha256};

use crate::error::{Error, Result};

/// The only digest algorithm currently supported.
const ALGORITHM_SHA256: &str = "sha256";

/// Number of hex characters in a SHA-256 digest.
const SHA256_HEX_LEN: usize = 64;

/// A content address in `algorithm:hex` form.
///
/// Digests name and verify registry content: a manifest references its config
/// and layers by digest, and a blob fetched from a registry must hash back to
/// the digest it was requested under. The algorithm is currently fixed to
/// `sha256` and the hex portion is always 64 lowercase hex characters.
///
/// # Examples
///
/// ```
/// use stowage_core::Digest;
///
/// let digest = Digest::from_bytes(b"test");
/// assert_eq!(
///     digest.to_string(),
///     "sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08",
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: String,
    hex: String,
}

impl Digest {
    /// Computes the SHA-256 digest of the exact byte sequence.
    ///
    /// No normalization is applied; the bytes are hashed as given.
    ///
    /// # Examples
    ///
    /// ```
    /// use stowage_core::Digest;
    ///
    /// let a = Digest::from_bytes(b"hello");
    /// let b = Digest::from_bytes(b"hello");
    /// assert_eq!(a, b);
    /// ```
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self {
            algorithm: ALGORITHM_SHA256.to_string(),
            hex: hex::encode(hasher.finalize()),
        }
    }

    /// Returns the algorithm part of the digest (e.g. `sha256`).
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Returns the hex part of the digest, without the algorithm prefix.
    #[must_use]
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Returns true if this digest matches the digest of `data`.
    #[must_use]
    pub fn matches(&self, data: &[u8]) -> bool {
        *self == Self::from_bytes(data)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl FromStr for Digest {
    type Err = Error;

    /// Parses and validates an `algorithm:hex` digest string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDigest`] if the separator is missing, the
    /// algorithm is not `sha256`, or the hex portion is not exactly 64
    /// lowercase hex characters.
    fn from_str(s: &str) -> Result<Self> {
        let Some((algorithm, hex)) = s.split_once(':') else {
            return Err(Error::InvalidDigest {
                digest: s.to_string(),
                reason: "missing ':' separator".to_string(),
            });
        };

        if algorithm != ALGORITHM_SHA256 {
            return Err(Error::InvalidDigest {
                digest: s.to_string(),
                reason: format!("unsupported algorithm '{algorithm}'"),
            });
        }

        if hex.len() != SHA256_HEX_LEN {
            return Err(Error::InvalidDigest {
                digest: s.to_string(),
                reason: format!(
                    "expected {SHA256_HEX_LEN} hex characters, found {}",
                    hex.len()
                ),
            });
        }

        if !hex
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(Error::InvalidDigest {
                digest: s.to_string(),
                reason: "hex portion must be lowercase hexadecimal".to_string(),
            });
        }

        Ok(Self {
            algorithm: algorithm.to_string(),
            hex: hex.to_string(),
        })
    }
}

impl serde::Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
