//! Input pre-processing.

use super::TextCorrector;
use crate::Result;

/// Runs raw input through the corrector.
///
/// The corrected text always proceeds downstream; a change is logged.
/// Corrector failures propagate.
pub fn preprocess(corrector: &dyn TextCorrector, text: &str) -> Result<String> {
    tracing::debug!(input = text, corrector = corrector.name(), "Pre-processing input");
    let corrected = corrector.correct(text)?;
    if corrected != text {
        tracing::info!(from = text, to = %corrected, "Auto-corrected input");
    }
    Ok(corrected)
}
