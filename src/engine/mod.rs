//! Response engine abstraction.
//!
//! The session treats pattern matching as an opaque capability: rule files
//! are learned once at startup and each processed input yields a response,
//! possibly empty. [`AimlKernel`] is the bundled implementation.

mod aiml;
mod loader;

pub use aiml::AimlKernel;
pub use loader::{RULE_FILE_EXTENSIONS, RuleLoadReport, discover_rule_files, load_rules};

use crate::Result;
use std::path::Path;

/// Trait for pattern-matching response engines.
pub trait ResponseEngine: Send {
    /// The engine name.
    fn name(&self) -> &'static str;

    /// Learns the rules in one rule file.
    ///
    /// Returns the number of rules added.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn learn(&mut self, path: &Path) -> Result<usize>;

    /// Produces a response for already pre-processed input.
    ///
    /// An empty string means no rule matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails; callers treat this as fatal.
    fn respond(&self, input: &str) -> Result<String>;
}
