//! Session memory document and exchange records.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default purpose recorded in fresh memory documents.
pub const DEFAULT_PURPOSE: &str = "To make reports and apply well.";

/// One conversational turn.
///
/// Serialized with the short keys `in`, `time`, `out` and `score` used by the
/// memory file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    /// Raw text received from the user.
    #[serde(rename = "in")]
    pub input: String,
    /// Local receipt time, ISO-8601 with microseconds.
    #[serde(rename = "time", default)]
    pub timestamp: String,
    /// Final text returned to the user.
    #[serde(rename = "out", default)]
    pub output: String,
    /// Optional rating supplied by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Exchange {
    /// Creates an exchange received at `received_at`.
    #[must_use]
    pub fn new(
        input: impl Into<String>,
        output: impl Into<String>,
        received_at: DateTime<Local>,
        score: Option<f64>,
    ) -> Self {
        Self {
            input: input.into(),
            timestamp: format_timestamp(received_at),
            output: output.into(),
            score,
        }
    }
}

/// Formats a timestamp the way exchange records store it.
#[must_use]
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// The persisted memory document of a bot instance.
///
/// `log` and `scores` are append-only. Keys the crate does not know about are
/// kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMemory {
    /// Opaque session identifier, assigned once.
    #[serde(default)]
    pub id: String,
    /// Chronological exchange log.
    #[serde(default)]
    pub log: Vec<Exchange>,
    /// Fixed descriptive purpose string.
    #[serde(default)]
    pub purpose: String,
    /// Name of the bot instance that owns the document.
    #[serde(default)]
    pub corrector: String,
    /// Scores of scored exchanges, in call order.
    #[serde(default)]
    pub scores: Vec<f64>,
    /// Unrecognized top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionMemory {
    /// Creates a fresh document with a new session identifier.
    #[must_use]
    pub fn fresh(corrector: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            log: Vec::new(),
            purpose: purpose.into(),
            corrector: corrector.into(),
            scores: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Appends an exchange, and its score when present.
    pub fn append(&mut self, exchange: Exchange) {
        if let Some(score) = exchange.score {
            self.scores.push(score);
        }
        self.log.push(exchange);
    }

    /// Number of recorded exchanges.
    #[must_use]
    pub fn exchange_count(&self) -> usize {
        self.log.len()
    }

    /// Mean of all recorded scores, if any.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_score(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        Some(self.scores.iter().sum::<f64>() / self.scores.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_uses_short_keys() {
        let exchange = Exchange {
            input: "hi".to_string(),
            timestamp: "2024-01-01T10:00:00.000000".to_string(),
            output: "hello".to_string(),
            score: None,
        };
        let json = serde_json::to_value(&exchange).unwrap();
        assert_eq!(json["in"], "hi");
        assert_eq!(json["out"], "hello");
        assert_eq!(json["time"], "2024-01-01T10:00:00.000000");
        assert!(json.get("score").is_none());
    }

    #[test]
    fn test_append_tracks_scores() {
        let mut memory = SessionMemory::fresh("Alice", DEFAULT_PURPOSE);
        memory.append(Exchange::new("a", "b", Local::now(), None));
        memory.append(Exchange::new("c", "d", Local::now(), Some(4.0)));

        assert_eq!(memory.exchange_count(), 2);
        assert_eq!(memory.scores, vec![4.0]);
        assert_eq!(memory.mean_score(), Some(4.0));
    }

    #[test]
    fn test_fresh_documents_get_distinct_ids() {
        let a = SessionMemory::fresh("Alice", DEFAULT_PURPOSE);
        let b = SessionMemory::fresh("Alice", DEFAULT_PURPOSE);
        assert_ne!(a.id, b.id);
        assert!(a.log.is_empty());
        assert_eq!(a.mean_score(), None);
    }

    #[test]
    fn test_unknown_keys_survive_roundtrip() {
        let raw = r#"{"id":"x","log":[],"purpose":"p","corrector":"c","scores":[],"ram_allocation_local":3}"#;
        let memory: SessionMemory = serde_json::from_str(raw).unwrap();
        assert_eq!(memory.extra["ram_allocation_local"], 3);

        let back = serde_json::to_value(&memory).unwrap();
        assert_eq!(back["ram_allocation_local"], 3);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = format_timestamp(Local::now());
        // YYYY-MM-DDTHH:MM:SS.ffffff
        assert_eq!(ts.len(), 26);
        assert_eq!(&ts[10..11], "T");
    }
}
