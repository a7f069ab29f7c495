//! `WWW-Authenticate` challenge parsing.
//!
//! A challenge is a scheme token followed by comma-separated `key="value"`
//! parameters. The parser is a small explicit scanner rather than a regular
//! expression: commas split parameters only outside quotes, every value must
//! be a single quoted string, and any leftover characters fail the parse
//! instead of being skipped.

use url::Url;

use crate::error::RegistryError;

/// A parsed authentication challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    /// The registry wants Basic credentials on the retried request.
    Basic,

    /// The registry wants a Bearer token obtained from a token endpoint.
    Bearer(BearerChallenge),

    /// A scheme this client does not know how to satisfy.
    Other(String),
}

impl Challenge {
    /// Parses a full challenge header value, scheme included.
    ///
    /// Schemes are matched case-insensitively. Parameters on a `Basic`
    /// challenge are ignored; an unknown scheme parses to
    /// [`Challenge::Other`] without examining its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidChallenge`] if the scheme is missing
    /// or a `Bearer` parameter list does not match the grammar.
    pub fn parse(header: &str) -> Result<Self, RegistryError> {
        let header = header.trim();
        let (scheme, params) = header
            .split_once(' ')
            .map_or((header, ""), |(scheme, params)| (scheme, params));

        if scheme.is_empty() {
            return Err(RegistryError::InvalidChallenge {
                header: header.to_string(),
                reason: "missing scheme".to_string(),
            });
        }

        if scheme.eq_ignore_ascii_case("basic") {
            Ok(Self::Basic)
        } else if scheme.eq_ignore_ascii_case("bearer") {
            BearerChallenge::parse(params).map(Self::Bearer)
        } else {
            Ok(Self::Other(scheme.to_string()))
        }
    }
}

/// Parameters of a `Bearer` challenge, consumed to build the token request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BearerChallenge {
    realm: Option<String>,
    service: Option<String>,
    scope: Vec<String>,
    other: Vec<(String, String)>,
}

impl BearerChallenge {
    /// Parses the parameter list of a `Bearer` challenge, scheme already
    /// stripped.
    ///
    /// `realm` and `service` keep the last occurrence; `scope` occurrences
    /// accumulate in order; unrecognized keys are preserved as extra pairs.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidChallenge`] for an empty parameter
    /// list, an unquoted or half-quoted value, an embedded quote, an
    /// unterminated quote, or a parameter without `=`.
    pub fn parse(params: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidChallenge {
            header: params.to_string(),
            reason,
        };

        if params.trim().is_empty() {
            return Err(invalid("no parameters".to_string()));
        }

        let mut challenge = Self::default();
        for segment in split_quoted_commas(params).map_err(&invalid)? {
            let segment = segment.trim();
            let Some((key, value)) = segment.split_once('=') else {
                return Err(invalid(format!(
                    "expected key=\"value\", found '{segment}'"
                )));
            };

            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(invalid(format!("invalid parameter name '{key}'")));
            }

            let value = value
                .trim()
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .ok_or_else(|| {
                    invalid(format!("value for '{key}' is not a single quoted string"))
                })?;
            if value.contains('"') {
                return Err(invalid(format!(
                    "value for '{key}' contains an embedded quote"
                )));
            }

            match key {
                "realm" => challenge.realm = Some(value.to_string()),
                "service" => challenge.service = Some(value.to_string()),
                "scope" => challenge.scope.push(value.to_string()),
                _ => challenge
                    .other
                    .push((key.to_string(), value.to_string())),
            }
        }

        Ok(challenge)
    }

    /// Returns the token endpoint URL, if the challenge named one.
    #[must_use]
    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    /// Returns the service name to request a token for.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    /// Returns the requested scopes, in header order.
    #[must_use]
    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    /// Returns parameters the client did not recognize, in header order.
    #[must_use]
    pub fn other(&self) -> &[(String, String)] {
        &self.other
    }

    /// Builds the token request URL: the realm with `service` and each
    /// `scope` appended as query parameters, preserving any query the realm
    /// already carries.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AuthenticationFailed`] if the challenge has
    /// no realm, or [`RegistryError::InvalidUrl`] if the realm is not a
    /// parseable URL.
    pub fn token_url(&self) -> Result<Url, RegistryError> {
        let realm =
            self.realm
                .as_deref()
                .ok_or_else(|| RegistryError::AuthenticationFailed {
                    message: "Bearer challenge carries no realm".to_string(),
                })?;

        let mut url = Url::parse(realm).map_err(|_| RegistryError::InvalidUrl {
            url: realm.to_string(),
        })?;

        if self.service.is_some() || !self.scope.is_empty() {
            let mut query = url.query_pairs_mut();
            if let Some(service) = &self.service {
                query.append_pair("service", service);
            }
            for scope in &self.scope {
                query.append_pair("scope", scope);
            }
        }

        Ok(url)
    }
}

/// Splits on commas that sit outside double quotes.
fn split_quoted_commas(input: &str) -> Result<Vec<&str>, String> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                segments.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err("unterminated quoted value".to_string());
    }

    segments.push(&input[start..]);
    Ok(segments)
}
