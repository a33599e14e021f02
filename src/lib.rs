//! # Rulebot
//!
//! A rule-based conversational bot with persistent session memory.
//!
//! Rulebot loads AIML pattern-response rule files into a response engine,
//! runs user text through a small pipeline (spell correction, matching,
//! mode-based framing) and keeps a memory document of every exchange on disk,
//! alongside a write-only audit trail of per-exchange log files.
//!
//! A separate utility, [`extract`], pulls business records out of free-form
//! text and writes them to a spreadsheet file.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rulebot::config::BotConfig;
//! use rulebot::engine::AimlKernel;
//! use rulebot::services::{PassthroughCorrector, Session};
//!
//! let config = BotConfig::default();
//! let mut session =
//!     Session::open(&config, Box::new(AimlKernel::new()), Box::new(PassthroughCorrector));
//! let reply = session.listen("hello there", None)?;
//! let summary = session.close()?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod engine;
pub mod extract;
pub mod models;
pub mod observability;
pub mod repl;
pub mod services;
pub mod storage;

pub use config::BotConfig;
pub use engine::{AimlKernel, ResponseEngine, RuleLoadReport};
pub use extract::BusinessRecord;
pub use models::{Exchange, Mode, SessionMemory, Settings};
pub use services::{Session, SessionSummary, TextCorrector};

/// Error type for rulebot operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Unknown mode names, malformed CLI values |
/// | `OperationFailed` | File I/O, rule parsing, JSON/CSV serialization |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - A rule file cannot be read or is not well-formed XML
    /// - The memory, settings or exchange log files cannot be written
    /// - The configuration file cannot be read or parsed
    /// - The spreadsheet export cannot be written
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for rulebot operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::OperationFailed {
            operation: "test".to_string(),
            cause: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'test' failed: failed");
    }
}
