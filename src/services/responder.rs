//! Response engine adapter with keyword fallback.

use crate::Result;
use crate::engine::ResponseEngine;

/// Reply used when neither the engine nor the fallback produce any text.
pub const NO_USABLE_WORDS: &str = "[No usable words]";

/// Maximum number of keywords echoed back by the fallback.
pub const MAX_FALLBACK_KEYWORDS: usize = 10;

/// Asks the engine for a response, never returning an empty string.
///
/// An empty or whitespace-only engine response is replaced by
/// [`keyword_fallback`] of the processed input.
pub fn respond(engine: &dyn ResponseEngine, processed: &str) -> Result<String> {
    let response = engine.respond(processed)?;
    if response.trim().is_empty() {
        tracing::debug!(engine = engine.name(), "Empty engine response, returning keywords");
        return Ok(keyword_fallback(processed));
    }
    Ok(response)
}

/// Up to ten purely alphabetic whitespace-delimited tokens of `text`, joined
/// by single spaces, or [`NO_USABLE_WORDS`] when there are none.
#[must_use]
pub fn keyword_fallback(text: &str) -> String {
    let keywords: Vec<&str> = text
        .split_whitespace()
        .filter(|word| word.chars().all(char::is_alphabetic))
        .take(MAX_FALLBACK_KEYWORDS)
        .collect();

    if keywords.is_empty() {
        NO_USABLE_WORDS.to_string()
    } else {
        keywords.join(" ")
    }
}
