//! Strategy selection
//!
//! Only two strategies exist. Callers may still send one of the historical
//! names; those map onto the canonical pair and anything unrecognised is
//! ignored in favour of pure selection.

use dgen_model::StrategyKind;

const PRIMARY_ALIASES: &[&str] = &[
    "primary",
    "ai",
    "enhanced",
    "context-guided",
    "guided",
    "intelligent",
    "smart",
];

const EMERGENCY_ALIASES: &[&str] = &[
    "emergency",
    "fallback",
    "template",
    "basic",
    "legacy",
    "deterministic",
    "offline",
];

/// Map a strategy name (canonical or legacy) onto a canonical strategy
#[must_use]
pub fn canonical_strategy(name: &str) -> Option<StrategyKind> {
    let name = name.trim().to_ascii_lowercase().replace('_', "-");
    if PRIMARY_ALIASES.contains(&name.as_str()) {
        Some(StrategyKind::Primary)
    } else if EMERGENCY_ALIASES.contains(&name.as_str()) {
        Some(StrategyKind::Emergency)
    } else {
        None
    }
}

/// Choose the strategy for one request
///
/// An explicit emergency request always wins. Otherwise the primary strategy
/// runs only when an AI provider is working.
#[must_use]
pub fn select_strategy(requested: Option<&str>, ai_available: bool) -> StrategyKind {
    match requested.and_then(canonical_strategy) {
        Some(StrategyKind::Emergency) => StrategyKind::Emergency,
        Some(StrategyKind::Primary) | None if ai_available => StrategyKind::Primary,
        _ => StrategyKind::Emergency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_legacy_names() {
        assert_eq!(canonical_strategy("Context_Guided"), Some(StrategyKind::Primary));
        assert_eq!(canonical_strategy(" smart "), Some(StrategyKind::Primary));
        assert_eq!(canonical_strategy("offline"), Some(StrategyKind::Emergency));
        assert_eq!(canonical_strategy("legacy"), Some(StrategyKind::Emergency));
        assert_eq!(canonical_strategy("quantum"), None);
    }

    #[test]
    fn selection_depends_on_provider() {
        assert_eq!(select_strategy(None, true), StrategyKind::Primary);
        assert_eq!(select_strategy(None, false), StrategyKind::Emergency);
        assert_eq!(select_strategy(Some("ai"), false), StrategyKind::Emergency);
        assert_eq!(select_strategy(Some("fallback"), true), StrategyKind::Emergency);
        assert_eq!(select_strategy(Some("unknown"), true), StrategyKind::Primary);
    }
}
