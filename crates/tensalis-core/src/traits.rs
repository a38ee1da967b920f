//! The seam between the verification engine and the network.
//!
//! The verifier and the streaming engine never talk HTTP themselves. They
//! hand a method, a path, and an optional JSON body to a `Transport`, and
//! receive the decoded response body or a typed error back. Retries,
//! authentication, and rate-limit handling all live behind this trait.

use serde_json::Value;

use tensalis_contracts::{error::TensalisResult, request::Method};

/// Sends one logical API request and returns the decoded JSON body.
///
/// Implementations are shared across sequential and concurrent verifier
/// calls, so they must be `Send + Sync`. Errors must be returned as the
/// matching `TensalisError` variant; callers propagate them unchanged.
pub trait Transport: Send + Sync {
    /// Send `payload` (if any) to `path` and return the response body.
    ///
    /// `path` is relative to the configured endpoint, e.g. `"/verify"`.
    fn send(&self, method: Method, path: &str, payload: Option<&Value>) -> TensalisResult<Value>;
}
