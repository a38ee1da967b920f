//! A single HTTP attempt against the Tensalis API.
//!
//! `Exchange` performs exactly one request and reports what happened without
//! interpreting it: a raw response (any status code), or an attempt failure
//! at the network level. Deciding whether to retry, wait, or raise is the
//! job of [`RetryingTransport`](crate::retry::RetryingTransport).

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use serde_json::Value;
use tracing::debug;

use tensalis_contracts::{
    error::{TensalisError, TensalisResult},
    request::Method,
};

use crate::config::ClientConfig;

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("tensalis-rust/", env!("CARGO_PKG_VERSION"));

/// Header carrying the requested strictness tier.
pub const MODE_HEADER: &str = "x-tensalis-mode";

/// What the server sent back, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// `Retry-After` in seconds, when present and numeric.
    pub retry_after: Option<u64>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after = Some(secs);
        self
    }
}

/// Why an attempt produced no response at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// No response within the per-request timeout.
    Timeout(String),
    /// DNS, TLS, refused connection, reset, and similar network failures.
    Connection(String),
}

/// Performs one HTTP request.
pub trait Exchange: Send + Sync {
    /// Send `payload` (if any) to the absolute `url`.
    fn execute(
        &self,
        method: Method,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<RawResponse, AttemptFailure>;
}

/// Build the headers attached to every request.
///
/// Returns `TensalisError::Configuration` if the API key cannot be encoded
/// as an HTTP header value.
pub fn default_headers(config: &ClientConfig) -> TensalisResult<HeaderMap> {
    let mut headers = HeaderMap::new();

    let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.trim())).map_err(|_| {
        TensalisError::configuration("API key contains characters not allowed in an HTTP header")
    })?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static(MODE_HEADER),
        HeaderValue::from_static(config.mode.as_str()),
    );

    Ok(headers)
}

/// Read `Retry-After` as whole seconds.
///
/// The HTTP-date form and anything else non-numeric yield `None`, leaving the
/// caller to apply its default wait.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// The production `Exchange`, backed by a blocking `reqwest` client.
///
/// The underlying client pools connections and is safe to share across
/// threads; one `ReqwestExchange` serves every request a client makes.
pub struct ReqwestExchange {
    http: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl ReqwestExchange {
    pub fn new(config: &ClientConfig) -> TensalisResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .default_headers(default_headers(config)?)
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TensalisError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            timeout_secs: config.timeout_secs,
        })
    }

    fn classify(&self, e: reqwest::Error) -> AttemptFailure {
        if e.is_timeout() {
            AttemptFailure::Timeout(format!("request timed out after {}s", self.timeout_secs))
        } else {
            AttemptFailure::Connection(format!("request failed: {e}"))
        }
    }
}

impl Exchange for ReqwestExchange {
    fn execute(
        &self,
        method: Method,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<RawResponse, AttemptFailure> {
        let method = match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut request = self.http.request(method, url);
        if let Some(body) = payload {
            request = request.json(body);
        }

        let response = request.send().map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().map_err(|e| self.classify(e))?;

        debug!(url, status, body_len = body.len(), "response received");

        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
