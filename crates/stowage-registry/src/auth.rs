//! Credential resolution and the Bearer token exchange.
//!
//! The handshake is deliberately asymmetric. The first attempt at any
//! registry request is always anonymous, so public pulls never spend
//! credentials the server did not ask for; only after a challenge does the
//! client authorize a single retry. The token request of a Bearer flow is
//! the one exception: locally available Basic credentials are attached to it
//! pre-emptively, because token endpoints grant anonymous pull tokens
//! without challenging and would otherwise never see the credentials at all.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::challenge::{BearerChallenge, Challenge};
use crate::config::RegistryAuth;
use crate::error::RegistryError;

/// Pluggable credential lookup keyed by request URL.
///
/// Implementations map a URL to a complete `Authorization` header value, so
/// any backend (netrc file, keychain, environment) can supply credentials
/// without the client depending on a concrete store.
pub trait CredentialResolver: Send + Sync {
    /// Returns an `Authorization` header value for the given URL, or `None`
    /// when the resolver has no credentials for it.
    fn authorization(&self, url: &Url) -> Option<String>;
}

/// Token endpoint response body.
///
/// `token` and `access_token` are synonyms across registry implementations;
/// `token` wins when both are present.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
    expires_in: Option<u64>,
    issued_at: Option<DateTime<Utc>>,
    refresh_token: Option<String>,
}

/// Answers authentication challenges on behalf of the client.
pub(crate) struct Authenticator {
    auth: RegistryAuth,
    resolver: Option<Arc<dyn CredentialResolver>>,
}

impl Authenticator {
    pub(crate) const fn new(
        auth: RegistryAuth,
        resolver: Option<Arc<dyn CredentialResolver>>,
    ) -> Self {
        Self { auth, resolver }
    }

    /// Returns the locally available `Authorization` value for a URL, if
    /// any. The resolver is consulted first, then the static configuration.
    fn local_credentials(&self, url: &Url) -> Option<String> {
        if let Some(resolver) = &self.resolver {
            if let Some(header) = resolver.authorization(url) {
                return Some(header);
            }
        }

        match &self.auth {
            RegistryAuth::None => None,
            RegistryAuth::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                Some(format!("Basic {encoded}"))
            }
        }
    }

    /// Produces the `Authorization` value for the retried request, or `None`
    /// when the challenge cannot be satisfied with what is configured.
    ///
    /// A Bearer challenge without a realm is an error, not a decline: the
    /// registry demanded a token exchange the client cannot perform.
    pub(crate) async fn authorize(
        &self,
        challenge: &Challenge,
        url: &Url,
        http: &reqwest::Client,
    ) -> Result<Option<String>, RegistryError> {
        match challenge {
            Challenge::Basic => Ok(self.local_credentials(url)),
            Challenge::Bearer(bearer) => self.exchange_token(bearer, http).await.map(Some),
            Challenge::Other(scheme) => {
                tracing::debug!(%scheme, "ignoring unsupported challenge scheme");
                Ok(None)
            }
        }
    }

    /// Runs the token round trip for a Bearer challenge.
    async fn exchange_token(
        &self,
        challenge: &BearerChallenge,
        http: &reqwest::Client,
    ) -> Result<String, RegistryError> {
        let token_url = challenge.token_url()?;
        tracing::debug!(url = %token_url, "requesting bearer token");

        let mut request = http.get(token_url.clone());
        if let Some(credentials) = self.local_credentials(&token_url) {
            request = request.header(reqwest::header::AUTHORIZATION, credentials);
        }

        let response = request.send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::TokenExchangeFailed {
                realm: token_url.to_string(),
                message: format!("HTTP {}: {body}", status.as_u16()),
            });
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!(
            expires_in = ?token.expires_in,
            issued_at = ?token.issued_at,
            has_refresh_token = token.refresh_token.is_some(),
            "received bearer token"
        );

        let value = token.token.or(token.access_token).ok_or_else(|| {
            RegistryError::TokenExchangeFailed {
                realm: token_url.to_string(),
                message: "response carried no token".to_string(),
            }
        })?;
        Ok(format!("Bearer {value}"))
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("auth", &self.auth)
            .field("resolver", &self.resolver.as_ref().map(|_| "<resolver>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedResolver(&'static str);

    impl CredentialResolver for FixedResolver {
        fn authorization(&self, _url: &Url) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn url() -> Url {
        Url::parse("https://registry.example.com/v2/").unwrap()
    }

    #[test]
    fn test_local_credentials_none_configured() {
        let authenticator = Authenticator::new(RegistryAuth::None, None);
        assert_eq!(authenticator.local_credentials(&url()), None);
    }

    #[test]
    fn test_local_credentials_basic_encoding() {
        let authenticator = Authenticator::new(RegistryAuth::basic("user", "pass"), None);
        // base64("user:pass")
        assert_eq!(
            authenticator.local_credentials(&url()),
            Some("Basic dXNlcjpwYXNz".to_string())
        );
    }

    #[test]
    fn test_local_credentials_resolver_wins() {
        let authenticator = Authenticator::new(
            RegistryAuth::basic("user", "pass"),
            Some(Arc::new(FixedResolver("Bearer from-resolver"))),
        );
        assert_eq!(
            authenticator.local_credentials(&url()),
            Some("Bearer from-resolver".to_string())
        );
    }

    #[tokio::test]
    async fn test_authorize_basic_without_credentials_declines() {
        let authenticator = Authenticator::new(RegistryAuth::None, None);
        let http = reqwest::Client::new();
        let result = authenticator
            .authorize(&Challenge::Basic, &url(), &http)
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_authorize_unknown_scheme_declines() {
        let authenticator = Authenticator::new(RegistryAuth::basic("u", "p"), None);
        let http = reqwest::Client::new();
        let result = authenticator
            .authorize(&Challenge::Other("Negotiate".to_string()), &url(), &http)
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_authorize_bearer_without_realm_fails() {
        let challenge = Challenge::parse(r#"Bearer service="svc""#).unwrap();
        let authenticator = Authenticator::new(RegistryAuth::None, None);
        let http = reqwest::Client::new();
        let result = authenticator.authorize(&challenge, &url(), &http).await;
        assert!(matches!(
            result,
            Err(RegistryError::AuthenticationFailed { .. })
        ));
    }

    #[test]
    fn test_token_response_prefers_token_field() {
        let body = r#"{"token": "primary", "access_token": "secondary"}"#;
        let response: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.token.or(response.access_token).unwrap(), "primary");
    }

    #[test]
    fn test_token_response_decodes_extras() {
        let body = r#"{
            "access_token": "abc",
            "expires_in": 300,
            "issued_at": "2024-05-01T12:00:00Z",
            "refresh_token": "xyz"
        }"#;
        let response: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.expires_in, Some(300));
        assert!(response.issued_at.is_some());
        assert_eq!(response.refresh_token.as_deref(), Some("xyz"));
    }
}
