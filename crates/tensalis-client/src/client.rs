//! `TensalisClient`: the ready-to-use entry point.
//!
//! Wires a validated `ClientConfig` to a `ReqwestExchange`, wraps it in the
//! retry policy, and hands the result to a core `Verifier`. Every
//! verification method simply delegates; the client adds no behaviour of its
//! own beyond construction.

use serde_json::Value;
use tracing::info;

use tensalis_contracts::{
    context::Context,
    error::TensalisResult,
    request::BatchItem,
    verdict::Verdict,
};
use tensalis_core::{traits::Transport, verifier::Verifier, VerifyStream};

use crate::config::ClientConfig;
use crate::exchange::ReqwestExchange;
use crate::retry::{RetryingTransport, ThreadSleeper};

/// Client for the Tensalis hallucination-detection API.
///
/// ```rust,ignore
/// use tensalis_client::{ClientConfig, TensalisClient};
///
/// let client = TensalisClient::new(ClientConfig::new("your-api-key"))?;
/// let verdict = client.verify(
///     "The policy allows 90-day returns.",
///     vec!["Returns accepted within 30 days."],
///     None,
/// )?;
/// if verdict.is_blocked() {
///     println!("Blocked: {}", verdict.reason().unwrap_or("no reason given"));
/// }
/// ```
pub struct TensalisClient {
    config: ClientConfig,
    verifier: Verifier,
}

impl TensalisClient {
    /// Build a client that talks to the configured endpoint over HTTPS.
    ///
    /// Returns `TensalisError::Configuration` if the config is invalid; no
    /// request is sent during construction.
    pub fn new(config: ClientConfig) -> TensalisResult<Self> {
        config.validate()?;
        let exchange = ReqwestExchange::new(&config)?;
        let transport = RetryingTransport::new(exchange, ThreadSleeper, config.base_url(), config.retries);

        info!(
            endpoint = config.base_url(),
            mode = %config.mode,
            retries = config.retries,
            timeout_secs = config.timeout_secs,
            "tensalis client ready"
        );

        Self::with_transport(config, Box::new(transport))
    }

    /// Build a client from `TENSALIS_*` environment variables.
    pub fn from_env() -> TensalisResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Build a client over a caller-supplied transport.
    ///
    /// The config is still validated so the client reports consistent
    /// settings, but only `transport` is used to send requests.
    pub fn with_transport(config: ClientConfig, transport: Box<dyn Transport>) -> TensalisResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            verifier: Verifier::new(transport),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying verifier, for callers that only need the core API.
    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    /// See [`Verifier::verify`].
    pub fn verify(
        &self,
        response: &str,
        context: impl Into<Context>,
        metadata: Option<&Value>,
    ) -> TensalisResult<Verdict> {
        self.verifier.verify(response, context, metadata)
    }

    /// See [`Verifier::verify_batch`].
    pub fn verify_batch(&self, items: &[BatchItem]) -> TensalisResult<Vec<Verdict>> {
        self.verifier.verify_batch(items)
    }

    /// See [`Verifier::verify_stream`].
    pub fn verify_stream<I>(
        &self,
        chunks: I,
        context: impl Into<Context>,
        check_interval: usize,
    ) -> TensalisResult<VerifyStream<'_, I::IntoIter>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.verifier.verify_stream(chunks, context, check_interval)
    }

    pub fn health(&self) -> TensalisResult<Value> {
        self.verifier.health()
    }

    pub fn usage(&self) -> TensalisResult<Value> {
        self.verifier.usage()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
