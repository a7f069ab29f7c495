//! Request execution with the bounded authentication retry.
//!
//! Every operation goes through [`Transport`]: one anonymous attempt, and if
//! the registry answers 401 with a challenge the authenticator can satisfy,
//! exactly one authorized retry. The retry limit is part of the contract, not
//! an internal loop, so a registry that keeps reissuing equivalent challenges
//! surfaces as a failure instead of spinning.

use reqwest::header::{HeaderMap, HeaderName, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Method, StatusCode};
use url::Url;

use crate::api::ErrorResponse;
use crate::auth::Authenticator;
use crate::challenge::Challenge;
use crate::error::RegistryError;

/// A registry request in rebuildable form.
///
/// `reqwest` requests are consumed on send; the challenge retry must re-send
/// byte-identical content with only the `Authorization` header added, so the
/// method, URL, headers, and body are kept where they can be built twice.
#[derive(Debug, Clone)]
pub(crate) struct RegistryRequest {
    method: Method,
    url: Url,
    headers: Vec<(HeaderName, String)>,
    body: Option<Vec<u8>>,
}

impl RegistryRequest {
    pub(crate) const fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub(crate) fn body(mut self, bytes: Vec<u8>) -> Self {
        self.body = Some(bytes);
        self
    }

    pub(crate) const fn url(&self) -> &Url {
        &self.url
    }
}

/// Status, headers, and body of a completed registry response.
#[derive(Debug)]
pub(crate) struct RegistryResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Executes registry requests, handling the authentication handshake.
#[derive(Debug)]
pub(crate) struct Transport {
    http: reqwest::Client,
    authenticator: Authenticator,
}

impl Transport {
    pub(crate) const fn new(http: reqwest::Client, authenticator: Authenticator) -> Self {
        Self {
            http,
            authenticator,
        }
    }

    /// Sends a request and returns whatever response the protocol settles
    /// on, after at most one challenge-triggered retry. No status policy is
    /// applied; probes that map statuses themselves use this directly.
    pub(crate) async fn dispatch(
        &self,
        request: &RegistryRequest,
    ) -> Result<RegistryResponse, RegistryError> {
        let response = self.send(request, None).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(header) = response.headers.get(WWW_AUTHENTICATE) else {
            return Ok(response);
        };
        let raw = header
            .to_str()
            .map_err(|_| RegistryError::InvalidChallenge {
                header: String::from_utf8_lossy(header.as_bytes()).into_owned(),
                reason: "header value is not valid ASCII".to_string(),
            })?;
        let challenge = Challenge::parse(raw)?;

        match self
            .authenticator
            .authorize(&challenge, &request.url, &self.http)
            .await?
        {
            Some(authorization) => {
                tracing::debug!(url = %request.url, "retrying with authorization");
                self.send(request, Some(&authorization)).await
            }
            None => Ok(response),
        }
    }

    /// Sends a request and enforces the operation's status contract.
    ///
    /// A status in `decodable_errors` is decoded as a registry error
    /// envelope; any other status that is not `expected` fails with the raw
    /// body for diagnostics.
    pub(crate) async fn execute(
        &self,
        request: RegistryRequest,
        expected: StatusCode,
        decodable_errors: &[StatusCode],
    ) -> Result<RegistryResponse, RegistryError> {
        let response = self.dispatch(&request).await?;

        if decodable_errors.contains(&response.status) {
            return Err(decode_api_error(&request.url, &response));
        }
        if response.status != expected {
            return Err(RegistryError::UnexpectedStatus {
                status: response.status.as_u16(),
                url: request.url.to_string(),
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        Ok(response)
    }

    async fn send(
        &self,
        request: &RegistryRequest,
        authorization: Option<&str>,
    ) -> Result<RegistryResponse, RegistryError> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value.as_str());
        }
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        tracing::debug!(method = %request.method, url = %request.url, "sending registry request");
        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        tracing::debug!(status = status.as_u16(), url = %request.url, "registry responded");

        Ok(RegistryResponse {
            status,
            headers,
            body,
        })
    }
}

/// Decodes a structured registry error body, falling back to the raw body
/// when the envelope does not parse.
fn decode_api_error(url: &Url, response: &RegistryResponse) -> RegistryError {
    match serde_json::from_slice::<ErrorResponse>(&response.body) {
        Ok(envelope) => RegistryError::Api {
            status: response.status.as_u16(),
            errors: envelope.errors,
        },
        Err(_) => RegistryError::UnexpectedStatus {
            status: response.status.as_u16(),
            url: url.to_string(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
        },
    }
}
