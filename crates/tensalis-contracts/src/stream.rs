//! Units emitted by a streaming verification session.
//!
//! A session yields one unit per chunk pulled from the source until either
//! the source runs dry or a check comes back blocked. The blocked unit is
//! always the last one and carries no chunk text: the chunk that tipped the
//! check over is withheld from the caller.

use std::fmt;

use serde::Serialize;

use crate::verdict::{Verdict, VerdictStatus};

/// Status attached to each emitted unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitStatus {
    /// The chunk passed through without a check.
    Pending,
    Verified,
    Warning,
    /// Terminal. No further units follow.
    Blocked,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
            Self::Warning => "WARNING",
            Self::Blocked => "BLOCKED",
        }
    }
}

impl From<VerdictStatus> for UnitStatus {
    fn from(status: VerdictStatus) -> Self {
        match status {
            VerdictStatus::Verified => Self::Verified,
            VerdictStatus::Warning => Self::Warning,
            VerdictStatus::Blocked => Self::Blocked,
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a streaming verification sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamUnit {
    /// The token count since the last check is still below the interval.
    Pending {
        /// The raw chunk, unchanged.
        text: String,
    },

    /// This chunk completed an interval and the accumulated text passed.
    Checked {
        /// The raw chunk, unchanged.
        text: String,
        /// Verdict of the check; its status is `Verified` or `Warning`.
        verdict: Verdict,
    },

    /// A check over the accumulated text came back blocked.
    Blocked { verdict: Verdict },
}

impl StreamUnit {
    pub fn status(&self) -> UnitStatus {
        match self {
            Self::Pending { .. } => UnitStatus::Pending,
            Self::Checked { verdict, .. } => verdict.status().into(),
            Self::Blocked { .. } => UnitStatus::Blocked,
        }
    }

    /// The chunk text to forward to the end user. `None` for a blocked unit.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Pending { text } | Self::Checked { text, .. } => Some(text),
            Self::Blocked { .. } => None,
        }
    }

    /// The verdict of the check this unit reports, if one ran.
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Self::Pending { .. } => None,
            Self::Checked { verdict, .. } | Self::Blocked { verdict } => Some(verdict),
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}
