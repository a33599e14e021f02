//! Interaction settings.

use super::Mode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flat key-value settings document.
///
/// Only `mode` is interpreted; every other key is carried through untouched.
/// The mode is kept as its raw string so that a document written by another
/// tool round-trips without being rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_mode(Mode::default())
    }
}

impl Settings {
    /// Creates settings holding only the given mode.
    #[must_use]
    pub fn with_mode(mode: Mode) -> Self {
        Self {
            mode: Some(mode.as_str().to_string()),
            extra: Map::new(),
        }
    }

    /// The active mode.
    ///
    /// Missing or unrecognized values resolve to the default mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
            .as_deref()
            .and_then(Mode::parse)
            .unwrap_or_default()
    }

    /// The stored mode string, exactly as found in the document.
    #[must_use]
    pub fn raw_mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    /// Returns true when a stored mode string does not name a known mode.
    #[must_use]
    pub fn has_unrecognized_mode(&self) -> bool {
        self.mode.as_deref().is_some_and(|m| Mode::parse(m).is_none())
    }

    /// Replaces the mode.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = Some(mode.as_str().to_string());
    }

    /// Looks up any other key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}
