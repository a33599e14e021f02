//! Persistence for the settings and session memory documents.
//!
//! Each document lives in its own pretty-printed JSON file. Loading never
//! fails: a missing or corrupt file yields a default document and a warning.

mod json_file;
mod memory;
mod settings;

pub use json_file::{ReadOutcome, read_document, write_document};
pub use memory::MemoryStore;
pub use settings::SettingsStore;
