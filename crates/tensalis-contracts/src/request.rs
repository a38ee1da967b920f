//! Wire-level request types for the Tensalis API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Context;
use crate::error::TensalisError;

pub const VERIFY_PATH: &str = "/verify";
pub const VERIFY_BATCH_PATH: &str = "/verify/batch";
pub const HEALTH_PATH: &str = "/health";
pub const USAGE_PATH: &str = "/usage";

/// The HTTP methods the API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strictness tier requested from the detection service.
///
/// Sent on every request as the `X-Tensalis-Mode` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Lowest tolerance; intended for healthcare and legal content.
    Strict,
    #[default]
    Balanced,
    Permissive,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Balanced => "balanced",
            Self::Permissive => "permissive",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = TensalisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "balanced" => Ok(Self::Balanced),
            "permissive" => Ok(Self::Permissive),
            other => Err(TensalisError::configuration(format!(
                "unknown mode '{other}': expected strict, balanced or permissive"
            ))),
        }
    }
}

/// Body of `POST /verify`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyRequest<'a> {
    pub response: &'a str,
    pub reference_facts: &'a Context,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<&'a Value>,
}

/// One entry of a batch verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub response: String,
    pub context: Context,
}

impl BatchItem {
    pub fn new(response: impl Into<String>, context: impl Into<Context>) -> Self {
        Self {
            response: response.into(),
            context: context.into(),
        }
    }
}

/// Body of `POST /verify/batch`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRequest<'a> {
    pub items: &'a [BatchItem],
}
