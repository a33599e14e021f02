//! Mode-based response framing.

use crate::models::Mode;

/// Frames `response` according to `mode`.
#[must_use]
pub fn influence(response: &str, mode: Mode) -> String {
    mode.influence(response)
}

/// Frames `response` according to a mode given by name.
///
/// Names that are not a known mode get the default mode, which leaves the
/// response unchanged.
#[must_use]
pub fn influence_named(response: &str, mode: &str) -> String {
    influence(response, Mode::parse(mode).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_modes() {
        assert_eq!(influence_named("ok", "mediation"), "[Mediation] ok");
        assert_eq!(influence_named("ok", "arbitration"), "[Arbitration] ok");
        assert_eq!(influence_named("ok", "fight-abating"), "Let's remain calm: ok");
        assert_eq!(influence_named("ok", "harmony"), "ok");
    }

    #[test]
    fn test_unknown_mode_is_identity() {
        assert_eq!(influence_named("ok", "unknown-mode"), "ok");
        assert_eq!(influence_named("", "zen"), "");
    }
}
