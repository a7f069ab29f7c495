//! Image reference model: registry host, repository path, tag or digest.
//!
//! References are validated against the distribution-spec naming grammar at
//! construction time. A repository is one or more `/`-separated components,
//! each a run of lowercase alphanumerics optionally broken by single `.`,
//! `_`, or `-` separators; a tag starts with a word character and is at most
//! 128 characters. The grammar checks are written as explicit character
//! scanners so the failure position and reason are precise.

use std::fmt;
use std::str::FromStr;

use crate::digest::Digest;
use crate::error::{Error, Result};

/// Maximum length of a tag, per the distribution spec.
const TAG_MAX_LEN: usize = 128;

/// Validates a repository name against the distribution-spec grammar.
///
/// The grammar is `[a-z0-9]+([._-][a-z0-9]+)*` for each `/`-separated
/// component: lowercase alphanumeric runs with single separators between
/// them, never at a component boundary.
///
/// # Errors
///
/// Returns [`Error::InvalidRepository`] naming the offending rule.
///
/// # Examples
///
/// ```
/// use stowage_core::reference::validate_repository;
///
/// assert!(validate_repository("library/app").is_ok());
/// assert!(validate_repository("my-team/some.service").is_ok());
/// assert!(validate_repository("Library/App").is_err());
/// ```
pub fn validate_repository(name: &str) -> Result<()> {
    let invalid = |reason: String| Error::InvalidRepository {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("must not be empty".to_string()));
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid("path components must not be empty".to_string()));
        }

        // Tracks whether the previous character can legally be followed by a
        // separator; separators never start a component, repeat, or end one.
        let mut after_alphanumeric = false;
        for c in component.chars() {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                after_alphanumeric = true;
            } else if matches!(c, '.' | '_' | '-') {
                if !after_alphanumeric {
                    return Err(invalid(format!(
                        "separator '{c}' must follow an alphanumeric character"
                    )));
                }
                after_alphanumeric = false;
            } else {
                return Err(invalid(format!("character '{c}' is not allowed")));
            }
        }
        if !after_alphanumeric {
            return Err(invalid("components must not end with a separator".to_string()));
        }
    }

    Ok(())
}

/// Validates a tag against the distribution-spec grammar.
///
/// A tag is 1 to 128 characters, starts with `[a-zA-Z0-9_]`, and continues
/// with `[a-zA-Z0-9._-]`.
///
/// # Errors
///
/// Returns [`Error::InvalidTag`] naming the offending rule.
pub fn validate_tag(tag: &str) -> Result<()> {
    let invalid = |reason: String| Error::InvalidTag {
        tag: tag.to_string(),
        reason,
    };

    let mut chars = tag.chars();
    let Some(first) = chars.next() else {
        return Err(invalid("must not be empty".to_string()));
    };

    if tag.len() > TAG_MAX_LEN {
        return Err(invalid(format!("must be at most {TAG_MAX_LEN} characters")));
    }

    if !(first.is_ascii_alphanumeric() || first == '_') {
        return Err(invalid(
            "must start with an alphanumeric character or '_'".to_string(),
        ));
    }

    for c in chars {
        if !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')) {
            return Err(invalid(format!("character '{c}' is not allowed")));
        }
    }

    Ok(())
}

/// A reference to content within a repository: either a mutable tag or an
/// immutable content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A mutable, human-readable tag such as `latest` or `v1.2.0`.
    Tag(String),
    /// An immutable content address.
    Digest(Digest),
}

impl Reference {
    /// Parses a reference string as a digest if it contains a `:` (tags
    /// cannot), otherwise as a tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDigest`] or [`Error::InvalidTag`] depending on
    /// which grammar the input was held to.
    pub fn parse(s: &str) -> Result<Self> {
        if s.contains(':') {
            Ok(Self::Digest(s.parse()?))
        } else {
            validate_tag(s)?;
            Ok(Self::Tag(s.to_string()))
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "{tag}"),
            Self::Digest(digest) => write!(f, "{digest}"),
        }
    }
}

/// A fully qualified image reference: registry host, repository, and a tag
/// or digest.
///
/// Immutable once constructed; all components are validated by the
/// constructor and parser.
///
/// # Examples
///
/// ```
/// use stowage_core::ImageReference;
///
/// let image: ImageReference = "registry.example.com/library/app:v1.2".parse()?;
/// assert_eq!(image.registry(), "registry.example.com");
/// assert_eq!(image.repository(), "library/app");
/// assert_eq!(image.reference().to_string(), "v1.2");
/// # Ok::<(), stowage_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    registry: String,
    repository: String,
    reference: Reference,
}

impl ImageReference {
    /// Creates a validated image reference from its parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry host is empty or contains `/`, if
    /// the repository fails [`validate_repository`], or if a tag reference
    /// fails [`validate_tag`].
    pub fn new(
        registry: impl Into<String>,
        repository: impl Into<String>,
        reference: Reference,
    ) -> Result<Self> {
        let registry = registry.into();
        let repository = repository.into();

        if registry.is_empty() || registry.contains('/') || registry.contains(char::is_whitespace)
        {
            return Err(Error::InvalidReference {
                reference: registry,
                reason: "registry must be a bare host or host:port".to_string(),
            });
        }
        validate_repository(&repository)?;
        if let Reference::Tag(tag) = &reference {
            validate_tag(tag)?;
        }

        Ok(Self {
            registry,
            repository,
            reference,
        })
    }

    /// Returns the registry host (and optional port).
    #[must_use]
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Returns the repository path within the registry.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns the tag or digest portion of the reference.
    #[must_use]
    pub const fn reference(&self) -> &Reference {
        &self.reference
    }
}

impl FromStr for ImageReference {
    type Err = Error;

    /// Parses `registry[:port]/repository[:tag|@digest]`.
    ///
    /// The first path segment must look like a registry host (contain a `.`
    /// or `:`, or be `localhost`); the tag defaults to `latest` when neither
    /// a tag nor a digest is present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`] when the overall shape is wrong,
    /// or the component-specific error for a bad repository, tag, or digest.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidReference {
            reference: s.to_string(),
            reason: reason.to_string(),
        };

        let Some((registry, rest)) = s.split_once('/') else {
            return Err(invalid("missing registry host"));
        };
        if !(registry.contains('.') || registry.contains(':') || registry == "localhost") {
            return Err(invalid(
                "first path segment must be a registry host (host[:port] or localhost)",
            ));
        }
        if rest.is_empty() {
            return Err(invalid("missing repository"));
        }

        // Digest references use '@'; tags use ':'. The repository grammar
        // contains neither, so a single split is unambiguous.
        let (repository, reference) = if let Some((repository, digest)) = rest.split_once('@') {
            (repository, Reference::Digest(digest.parse()?))
        } else if let Some((repository, tag)) = rest.split_once(':') {
            validate_tag(tag)?;
            (repository, Reference::Tag(tag.to_string()))
        } else {
            (rest, Reference::Tag("latest".to_string()))
        };

        validate_repository(repository)?;

        Ok(Self {
            registry: registry.to_string(),
            repository: repository.to_string(),
            reference,
        })
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = match self.reference {
            Reference::Tag(_) => ':',
            Reference::Digest(_) => '@',
        };
        write!(
            f,
            "{}/{}{}{}",
            self.registry, self.repository, separator, self.reference
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    #[test]
    fn test_validate_repository_accepts_valid_names() {
        for name in [
            "app",
            "library/app",
            "a0/b1",
            "my-team/some.service/api_v2",
            "0numeric",
        ] {
            assert!(validate_repository(name).is_ok(), "rejected {name}");
        }
    }

    #[test]
    fn test_validate_repository_rejects_invalid_names() {
        for name in [
            "",
            "App",
            "a//b",
            "a/",
            "/a",
            "a..b",
            "a._b",
            "-leading",
            "trailing-",
            "a b",
            "team/App",
            "with:colon",
        ] {
            assert!(validate_repository(name).is_err(), "accepted {name}");
        }
    }

    #[test]
    fn test_validate_tag_accepts_valid_tags() {
        for tag in ["latest", "v1.2.3", "_internal", "A.B-c_d", "1"] {
            assert!(validate_tag(tag).is_ok(), "rejected {tag}");
        }
    }

    #[test]
    fn test_validate_tag_rejects_invalid_tags() {
        let too_long = "x".repeat(129);
        for tag in ["", ".hidden", "-x", "sp ace", "with:colon", too_long.as_str()] {
            assert!(validate_tag(tag).is_err(), "accepted {tag}");
        }
    }

    #[test]
    fn test_validate_tag_accepts_max_length() {
        let tag = "x".repeat(128);
        assert!(validate_tag(&tag).is_ok());
    }

    #[test]
    fn test_reference_parse_tag() {
        let reference = Reference::parse("latest").unwrap();
        assert_eq!(reference, Reference::Tag("latest".to_string()));
    }

    #[test]
    fn test_reference_parse_digest() {
        let reference = Reference::parse(DIGEST).unwrap();
        assert!(matches!(reference, Reference::Digest(_)));
        assert_eq!(reference.to_string(), DIGEST);
    }

    #[test]
    fn test_reference_parse_colon_forces_digest_grammar() {
        // A colon can never appear in a tag, so this must fail as a digest.
        let err = Reference::parse("v1:2").unwrap_err();
        assert!(matches!(err, Error::InvalidDigest { .. }));
    }

    #[test]
    fn test_image_reference_parse_with_tag() {
        let image: ImageReference = "registry.example.com/library/app:v1.2".parse().unwrap();
        assert_eq!(image.registry(), "registry.example.com");
        assert_eq!(image.repository(), "library/app");
        assert_eq!(image.reference(), &Reference::Tag("v1.2".to_string()));
    }

    #[test]
    fn test_image_reference_parse_default_tag() {
        let image: ImageReference = "localhost:5000/app".parse().unwrap();
        assert_eq!(image.registry(), "localhost:5000");
        assert_eq!(image.repository(), "app");
        assert_eq!(image.reference(), &Reference::Tag("latest".to_string()));
    }

    #[test]
    fn test_image_reference_parse_with_digest() {
        let raw = format!("registry.example.com:8443/team/app@{DIGEST}");
        let image: ImageReference = raw.parse().unwrap();
        assert_eq!(image.registry(), "registry.example.com:8443");
        assert_eq!(image.repository(), "team/app");
        assert!(matches!(image.reference(), Reference::Digest(_)));
    }

    #[test]
    fn test_image_reference_parse_rejects_missing_registry() {
        assert!("app".parse::<ImageReference>().is_err());
        assert!("team/app".parse::<ImageReference>().is_err());
    }

    #[test]
    fn test_image_reference_parse_rejects_bad_repository() {
        let err = "registry.example.com/Bad.Name".parse::<ImageReference>();
        assert!(matches!(err, Err(Error::InvalidRepository { .. })));
    }

    #[test]
    fn test_image_reference_display_round_trip() {
        for raw in [
            "registry.example.com/library/app:v1.2",
            "localhost:5000/app:latest",
        ] {
            let image: ImageReference = raw.parse().unwrap();
            assert_eq!(image.to_string(), raw);
            let reparsed: ImageReference = image.to_string().parse().unwrap();
            assert_eq!(reparsed, image);
        }
    }

    #[test]
    fn test_image_reference_new_validates() {
        assert!(ImageReference::new(
            "registry.example.com",
            "library/app",
            Reference::Tag("v1".to_string()),
        )
        .is_ok());

        assert!(ImageReference::new(
            "registry.example.com",
            "Library",
            Reference::Tag("v1".to_string()),
        )
        .is_err());

        assert!(ImageReference::new(
            "",
            "library/app",
            Reference::Tag("v1".to_string()),
        )
        .is_err());
    }
}
