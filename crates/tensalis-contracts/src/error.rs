//! Error types for the Tensalis client.
//!
//! All fallible operations return `TensalisResult<T>`. Transport failures
//! travel unchanged through the verifier and the streaming engine, so a
//! caller matching on a variant sees exactly what the transport raised.

use serde_json::Value;
use thiserror::Error;

/// The unified error type for the Tensalis client.
#[derive(Debug, Error)]
pub enum TensalisError {
    /// A required configuration value is missing or invalid.
    ///
    /// Raised at construction time, before any request is sent.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// Client-side input was rejected before any request was sent.
    #[error("validation error on '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// The server answered with a status code of 400 or above.
    #[error("[{status}] {message}")]
    Api {
        status: u16,
        message: String,
        /// The parsed error body, or `Value::Null` when the server sent none.
        body: Value,
    },

    /// The server rejected the API key (HTTP 401).
    #[error("[401] {message}")]
    Authentication { message: String, body: Value },

    /// Every attempt in the retry budget was answered with HTTP 429.
    #[error("rate limit exceeded (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64, body: Value },

    /// The last attempt timed out.
    #[error("request timed out: {reason}")]
    Timeout { reason: String },

    /// The last attempt failed at the network level.
    #[error("connection failed: {reason}")]
    Connection { reason: String },

    /// The server's body could not be decoded into the expected shape.
    #[error("invalid response payload: {reason}")]
    InvalidResponse { reason: String },
}

impl TensalisError {
    /// Shorthand for a `Validation` error on `field`.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a `Configuration` error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// The HTTP status code behind this error, if the server produced one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Authentication { .. } => Some(401),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// The server-supplied error body, for errors that carry one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Api { body, .. }
            | Self::Authentication { body, .. }
            | Self::RateLimited { body, .. } => Some(body),
            _ => None,
        }
    }

    /// The API error code (`code` in the error body), if present.
    pub fn error_code(&self) -> Option<&str> {
        self.body()?.get("code")?.as_str()
    }

    /// The server's request ID (`request_id` in the error body), for support tickets.
    pub fn request_id(&self) -> Option<&str> {
        self.body()?.get("request_id")?.as_str()
    }
}

/// Convenience alias used throughout the Tensalis crates.
pub type TensalisResult<T> = Result<T, TensalisError>;
