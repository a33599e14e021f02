//! Data models for rulebot.
//!
//! This module contains the documents and value types shared by the session
//! pipeline and the storage layer.

mod memory;
mod mode;
mod settings;

pub use memory::{DEFAULT_PURPOSE, Exchange, SessionMemory, format_timestamp};
pub use mode::Mode;
pub use settings::Settings;
