//! The verdict returned by one verification call.
//!
//! The server's payload is decoded once into an immutable `Verdict`. Every
//! field except `status` is optional on the wire and stays optional here:
//! a missing `severity` is `None`, never an empty string. A missing `status`
//! means the server found nothing to flag, so it decodes as `Verified`.
//!
//! Only `status` can make a payload undecodable. A malformed optional field
//! is logged and read as `None`; a block must never be lost because the
//! server sent `"latency_ms": 12.5`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{TensalisError, TensalisResult};

/// The overall outcome of a verification call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    /// The response is grounded in the supplied context.
    #[default]
    Verified,
    /// The response contradicts or fabricates beyond the context.
    Blocked,
    /// The response is suspicious but not blocked.
    Warning,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED",
            Self::Blocked => "BLOCKED",
            Self::Warning => "WARNING",
        }
    }
}

impl FromStr for VerdictStatus {
    type Err = TensalisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VERIFIED" => Ok(Self::Verified),
            "BLOCKED" => Ok(Self::Blocked),
            "WARNING" => Ok(Self::Warning),
            _ => Err(TensalisError::InvalidResponse {
                reason: format!("malformed verdict payload: unknown status '{s}'"),
            }),
        }
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious a flagged issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl FromStr for Severity {
    type Err = TensalisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(TensalisError::InvalidResponse {
                reason: format!("unknown severity '{s}'"),
            }),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of one verification call.
///
/// `severity`, `reason` and `layer` only carry meaning when the status is not
/// `Verified`, and the server may omit them even then.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    status: VerdictStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    /// The payload exactly as the server sent it.
    #[serde(skip)]
    raw: Value,
}

impl Verdict {
    /// Decode a verdict from a server payload.
    ///
    /// Returns `TensalisError::InvalidResponse` when the payload is not a JSON
    /// object or its `status` is not a known status string. Unknown keys are
    /// ignored; malformed optional fields decode as `None`.
    pub fn from_value(raw: Value) -> TensalisResult<Self> {
        let Some(fields) = raw.as_object() else {
            return Err(TensalisError::InvalidResponse {
                reason: format!("verdict payload must be a JSON object, got {raw}"),
            });
        };

        let status = match fields.get("status") {
            None | Some(Value::Null) => VerdictStatus::default(),
            Some(Value::String(s)) => s.parse()?,
            Some(other) => {
                return Err(TensalisError::InvalidResponse {
                    reason: format!("malformed verdict payload: status must be a string, got {other}"),
                })
            }
        };

        let severity = optional_field(fields, "severity", |v| {
            v.as_str().and_then(|s| s.parse::<Severity>().ok())
        });
        let reason = optional_field(fields, "reason", |v| v.as_str().map(str::to_owned));
        let confidence = optional_field(fields, "confidence", Value::as_f64);
        let layer = optional_field(fields, "layer", |v| v.as_str().map(str::to_owned));
        let latency_ms = optional_field(fields, "latency_ms", decode_latency);

        Ok(Self {
            status,
            severity,
            reason,
            confidence,
            layer,
            latency_ms,
            raw,
        })
    }

    pub fn status(&self) -> VerdictStatus {
        self.status
    }

    pub fn severity(&self) -> Option<Severity> {
        self.severity
    }

    /// Human-readable explanation of the flagged issue.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Detection confidence, nominally in `[0.0, 1.0]`.
    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    /// Which detection stage produced the verdict (e.g. `"cascading_nli"`).
    pub fn layer(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    /// Server-side processing time.
    pub fn latency_ms(&self) -> Option<u64> {
        self.latency_ms
    }

    pub fn is_blocked(&self) -> bool {
        self.status == VerdictStatus::Blocked
    }

    pub fn is_verified(&self) -> bool {
        self.status == VerdictStatus::Verified
    }

    pub fn is_warning(&self) -> bool {
        self.status == VerdictStatus::Warning
    }

    /// The raw payload, including any keys this client does not model.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Decode one optional field. Absent and `null` are `None`; a value `decode`
/// rejects is logged and also `None`.
fn optional_field<T>(
    fields: &Map<String, Value>,
    key: &str,
    decode: impl FnOnce(&Value) -> Option<T>,
) -> Option<T> {
    let value = fields.get(key).filter(|v| !v.is_null())?;
    let decoded = decode(value);
    if decoded.is_none() {
        warn!(field = key, value = %value, "ignoring malformed verdict field");
    }
    decoded
}

fn decode_latency(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|ms| ms.is_finite() && *ms >= 0.0)
            .map(|ms| ms.round() as u64)
    })
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Some(severity) => write!(f, "Verdict(status={}, severity={})", self.status, severity),
            None => write!(f, "Verdict(status={}, severity=None)", self.status),
        }
    }
}
