//! Retry policy layered over an `Exchange`.
//!
//! `RetryingTransport` implements the core `Transport` trait. Per request it
//! makes at most `retries` attempts:
//!
//! | Outcome of an attempt         | Action                                              |
//! |-------------------------------|-----------------------------------------------------|
//! | 2xx / 3xx                     | decode the body and return it                       |
//! | 429                           | sleep `Retry-After` (default 1s), try again         |
//! | 401                           | raise `Authentication`, no retry                    |
//! | any other status ≥ 400        | raise `Api`, no retry                               |
//! | timeout / connection failure  | sleep `2^attempt` seconds, try again                |
//!
//! A rate-limited attempt consumes an attempt but skips the exponential
//! backoff. No sleep follows the final attempt. When the budget runs out the
//! error reflects the last failure: `RateLimited`, `Timeout`, or `Connection`.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use tensalis_contracts::{
    error::{TensalisError, TensalisResult},
    request::Method,
};
use tensalis_core::traits::Transport;

use crate::exchange::{AttemptFailure, Exchange, RawResponse};

/// Wait applied to a 429 that carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Blocks the current thread between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// The production sleeper.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Backoff after the failed attempt with zero-based index `attempt`.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// A `Transport` that retries transient failures of an `Exchange`.
pub struct RetryingTransport<E, S = ThreadSleeper> {
    exchange: E,
    sleeper: S,
    base_url: String,
    retries: u32,
}

impl<E, S> RetryingTransport<E, S>
where
    E: Exchange,
    S: Sleeper,
{
    /// `base_url` is joined with each request path as-is; pass it without a
    /// trailing slash. `retries` below 1 is raised to 1.
    pub fn new(exchange: E, sleeper: S, base_url: impl Into<String>, retries: u32) -> Self {
        Self {
            exchange,
            sleeper,
            base_url: base_url.into(),
            retries: retries.max(1),
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }
}

impl<E, S> Transport for RetryingTransport<E, S>
where
    E: Exchange,
    S: Sleeper,
{
    fn send(&self, method: Method, path: &str, payload: Option<&Value>) -> TensalisResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error: Option<TensalisError> = None;

        for attempt in 0..self.retries {
            let is_last = attempt + 1 == self.retries;
            debug!(
                method = %method,
                path,
                attempt = attempt + 1,
                max_attempts = self.retries,
                "sending request"
            );

            match self.exchange.execute(method, &url, payload) {
                Ok(response) if response.status == 429 => {
                    let wait = response.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    warn!(path, attempt = attempt + 1, retry_after_secs = wait, "rate limited");
                    last_error = Some(TensalisError::RateLimited {
                        retry_after_secs: wait,
                        body: parse_error_body(&response.body),
                    });
                    if !is_last {
                        self.sleeper.sleep(Duration::from_secs(wait));
                    }
                    continue;
                }
                Ok(response) if response.status >= 400 => {
                    let err = api_error(response);
                    warn!(path, error = %err, "API returned an error");
                    return Err(err);
                }
                Ok(response) => return decode_body(&response.body),
                Err(AttemptFailure::Timeout(reason)) => {
                    warn!(path, attempt = attempt + 1, %reason, "request timed out");
                    last_error = Some(TensalisError::Timeout { reason });
                }
                Err(AttemptFailure::Connection(reason)) => {
                    warn!(path, attempt = attempt + 1, %reason, "connection failed");
                    last_error = Some(TensalisError::Connection { reason });
                }
            }

            if !is_last {
                let delay = backoff_delay(attempt);
                debug!(path, delay_secs = delay.as_secs(), "backing off before retry");
                self.sleeper.sleep(delay);
            }
        }

        Err(last_error.unwrap_or_else(|| TensalisError::Connection {
            reason: "request failed after retries".to_string(),
        }))
    }
}

/// Decode a success body. An empty body decodes as an empty object.
fn decode_body(body: &str) -> TensalisResult<Value> {
    if body.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(body).map_err(|e| TensalisError::InvalidResponse {
        reason: format!("response body is not valid JSON: {e}"),
    })
}

/// Parse an error body leniently: JSON if possible, else wrap the text.
fn parse_error_body(body: &str) -> Value {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return json!({});
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| json!({ "error": trimmed }))
}

fn api_error(response: RawResponse) -> TensalisError {
    let body = parse_error_body(&response.body);
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
        .unwrap_or("Unknown error")
        .to_string();

    if response.status == 401 {
        TensalisError::Authentication { message, body }
    } else {
        TensalisError::Api {
            status: response.status,
            message,
            body,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
