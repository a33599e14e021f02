//! Response framing modes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named response-framing style applied to every outgoing reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Replies are passed through unchanged.
    #[default]
    Harmony,
    /// Replies are tagged as mediation.
    Mediation,
    /// Replies are tagged as arbitration.
    Arbitration,
    /// Replies are prefixed with a calming phrase.
    FightAbating,
}

impl Mode {
    /// Returns all mode variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Harmony,
            Self::Mediation,
            Self::Arbitration,
            Self::FightAbating,
        ]
    }

    /// Returns the mode as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Harmony => "harmony",
            Self::Mediation => "mediation",
            Self::Arbitration => "arbitration",
            Self::FightAbating => "fight-abating",
        }
    }

    /// Parses a mode from a string, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "harmony" => Some(Self::Harmony),
            "mediation" => Some(Self::Mediation),
            "arbitration" => Some(Self::Arbitration),
            "fight-abating" => Some(Self::FightAbating),
            _ => None,
        }
    }

    /// Comma-separated list of accepted mode names, for user-facing messages.
    #[must_use]
    pub fn names() -> String {
        Self::all()
            .iter()
            .map(Self::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Applies this mode's framing to a response.
    #[must_use]
    pub fn influence(self, response: &str) -> String {
        match self {
            Self::Mediation => format!("[Mediation] {response}"),
            Self::Arbitration => format!("[Arbitration] {response}"),
            Self::FightAbating => format!("Let's remain calm: {response}"),
            Self::Harmony => response.to_string(),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
