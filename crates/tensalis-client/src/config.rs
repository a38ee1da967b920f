//! Client configuration.
//!
//! A `ClientConfig` can be built in code, parsed from TOML, or read from the
//! environment. Whatever the source, `validate()` runs before a client is
//! constructed, so a missing API key surfaces as
//! `TensalisError::Configuration` without any network activity.
//!
//! Example TOML:
//! ```toml
//! api_key = "tsk_live_..."
//! endpoint = "https://api.tensalis.com/v1"
//! timeout_secs = 30
//! retries = 3
//! mode = "strict"
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use tensalis_contracts::{
    error::{TensalisError, TensalisResult},
    request::Mode,
};

pub const DEFAULT_ENDPOINT: &str = "https://api.tensalis.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRIES: u32 = 3;

pub const ENV_API_KEY: &str = "TENSALIS_API_KEY";
pub const ENV_ENDPOINT: &str = "TENSALIS_ENDPOINT";
pub const ENV_MODE: &str = "TENSALIS_MODE";
pub const ENV_TIMEOUT_SECS: &str = "TENSALIS_TIMEOUT_SECS";
pub const ENV_RETRIES: &str = "TENSALIS_RETRIES";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

/// Connection and behaviour settings for a `TensalisClient`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Bearer token sent with every request. Required.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the API. A trailing `/` is ignored.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum attempts per request, including the first.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Strictness tier sent as `X-Tensalis-Mode`.
    #[serde(default)]
    pub mode: Mode,
}

impl ClientConfig {
    /// A config with the given key and every other setting at its default.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: default_endpoint(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retries: DEFAULT_RETRIES,
            mode: Mode::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `TensalisError::Configuration` if the TOML is malformed, does
    /// not match the expected shape, or fails validation.
    pub fn from_toml_str(s: &str) -> TensalisResult<Self> {
        let config: ClientConfig = toml::from_str(s).map_err(|e| {
            TensalisError::configuration(format!("failed to parse client config TOML: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML client configuration.
    pub fn from_file(path: &Path) -> TensalisResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TensalisError::configuration(format!(
                "failed to read client config '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Build a config from `TENSALIS_*` environment variables.
    pub fn from_env() -> TensalisResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests pass a map-backed closure instead of
    /// mutating the process environment. Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> TensalisResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(lookup(ENV_API_KEY).unwrap_or_default());

        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        if let Some(mode) = lookup(ENV_MODE) {
            config.mode = mode.parse()?;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = parse_number(ENV_TIMEOUT_SECS, &timeout)?;
        }
        if let Some(retries) = lookup(ENV_RETRIES) {
            config.retries = parse_number(ENV_RETRIES, &retries)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check every setting the client depends on.
    pub fn validate(&self) -> TensalisResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(TensalisError::configuration("API key is required"));
        }
        if self.base_url().is_empty() {
            return Err(TensalisError::configuration("endpoint must not be empty"));
        }
        if !(self.base_url().starts_with("http://") || self.base_url().starts_with("https://")) {
            return Err(TensalisError::configuration(format!(
                "endpoint '{}' must start with http:// or https://",
                self.endpoint
            )));
        }
        if self.timeout_secs == 0 {
            return Err(TensalisError::configuration("timeout_secs must be at least 1"));
        }
        if self.retries == 0 {
            return Err(TensalisError::configuration("retries must be at least 1"));
        }
        Ok(())
    }

    /// The endpoint without its trailing slash.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }
}

// The API key never reaches logs through `{:?}`.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("retries", &self.retries)
            .field("mode", &self.mode)
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> TensalisResult<T> {
    value.trim().parse().map_err(|_| {
        TensalisError::configuration(format!("{name} must be a non-negative integer, got '{value}'"))
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
