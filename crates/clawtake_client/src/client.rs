//! HTTP gateway: build one request against the service, send it, classify the
//! response into a decoded JSON body or a [`ClientError`].

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;

use crate::config::Credentials;

/// Header carrying the agent API key.
pub const AGENT_KEY_HEADER: &str = "x-agent-key";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Decoded JSON body of a successful response.
pub type ApiResult = serde_json::Value;

/// Query parameters appended to a request.
pub type Query<'a> = [(&'a str, String)];

/// Request/response failure.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Credentials that cannot be turned into a request (unparseable service
    /// URL, key with bytes not allowed in a header). Raised by [`Client::new`].
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    /// DNS failure, refused or reset connection, timeout.
    #[error("Connection error: {reason}")]
    Network { reason: String },
    /// Non-2xx response. `message` is the server's explanation when it sent
    /// one, otherwise a generic description of the status.
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },
    /// 2xx response whose body is not the JSON we expect.
    #[error("Malformed response: {0}")]
    Protocol(String),
    /// A key-requiring operation was attempted without a configured key.
    #[error("{operation} requires an API key; set CLAWTAKE_API_KEY or run `clawtake register`")]
    MissingApiKey { operation: &'static str },
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network {
            reason: e.to_string(),
        }
    }
}

/// Client bound to one set of credentials. Credentials are never re-read.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    credentials: Credentials,
    base: Url,
    headers: HeaderMap,
}

impl Client {
    pub fn new(credentials: Credentials) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Self::with_http(credentials, http)
    }

    /// Use a preconfigured `reqwest::Client` (custom timeouts, proxies).
    pub fn with_http(credentials: Credentials, http: reqwest::Client) -> Result<Self, ClientError> {
        let base = Url::parse(&credentials.service_url).map_err(|e| {
            ClientError::InvalidCredentials(format!(
                "service URL {:?}: {}",
                credentials.service_url, e
            ))
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidCredentials(format!(
                "service URL {:?} cannot carry a path",
                credentials.service_url
            )));
        }
        let headers = default_headers(&credentials)?;
        Ok(Self {
            http,
            credentials,
            base,
            headers,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Fail with [`ClientError::MissingApiKey`] unless a key is configured.
    pub fn require_key(&self, operation: &'static str) -> Result<(), ClientError> {
        if self.credentials.has_key() {
            Ok(())
        } else {
            Err(ClientError::MissingApiKey { operation })
        }
    }

    /// Service URL with `segments` appended to its path, each one escaped.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn get(&self, segments: &[&str], query: &Query<'_>) -> Result<ApiResult, ClientError> {
        self.send::<()>(Method::GET, segments, query, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<ApiResult, ClientError> {
        self.send(Method::POST, segments, &[], Some(body)).await
    }

    /// Send one request to the service URL extended by `segments`. With
    /// `body = None` no request body is sent at all.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        query: &Query<'_>,
        body: Option<&B>,
    ) -> Result<ApiResult, ClientError> {
        let url = self.endpoint(segments);
        let path = url.path().to_string();
        tracing::debug!(%method, path = %path, authenticated = self.credentials.has_key(), "sending request");

        let mut request = self
            .http
            .request(method.clone(), url)
            .headers(self.headers.clone());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, path = %path, error = %e, "request failed");
            ClientError::from(e)
        })?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(status, &bytes);
            tracing::debug!(%method, path = %path, status = status.as_u16(), %message, "request rejected");
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            ClientError::Protocol(format!(
                "{} {} returned invalid JSON: {}",
                method, path, e
            ))
        })
    }
}

fn default_headers(credentials: &Credentials) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("clawtake/", env!("CARGO_PKG_VERSION"))),
    );
    if credentials.has_key() {
        let value = HeaderValue::from_str(&credentials.api_key).map_err(|_| {
            ClientError::InvalidCredentials(
                "API key contains characters not allowed in an HTTP header".into(),
            )
        })?;
        headers.insert(AGENT_KEY_HEADER, value);
    }
    Ok(headers)
}

/// Message for a non-2xx response: `error.message` from a JSON body, else a
/// description of the status code.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| fallback_message(status))
}

fn fallback_message(status: StatusCode) -> String {
    format!(
        "HTTP Error {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status")
    )
}
