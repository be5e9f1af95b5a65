//! Rendered output
//!
//! [`RenderedDocument`] is the terminal artifact handed back to the caller.
//! It records which strategy produced it, how confident the pipeline is, and
//! the trail of attempts that led there.

use crate::error::ModelError;
use crate::template::ResolutionPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Canonical generation strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// AI-augmented rendering with internal sub-fallbacks
    Primary,
    /// Deterministic rendering with no external calls
    Emergency,
}

impl StrategyKind {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Self::Primary),
            "emergency" => Ok(Self::Emergency),
            other => Err(ModelError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Sub-steps of the primary strategy, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimaryStep {
    /// Template-structured AI call over the full context
    ContextGuided,
    /// Less-structured AI call over the context summary
    SummaryOnly,
    /// AI call over the raw description/selection only
    RawDescription,
}

impl PrimaryStep {
    /// All steps in attempt order
    pub const ORDER: [PrimaryStep; 3] = [
        Self::ContextGuided,
        Self::SummaryOnly,
        Self::RawDescription,
    ];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContextGuided => "context-guided",
            Self::SummaryOnly => "summary-only",
            Self::RawDescription => "raw-description",
        }
    }
}

impl fmt::Display for PrimaryStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    TimedOut,
    ProviderFailed,
    EmptyResponse,
    ValidationFailed,
    RenderFailed,
    Skipped,
}

/// One entry in the attempt trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// `context-guided`, `summary-only`, `raw-description` or `emergency`
    pub step: String,
    pub outcome: AttemptOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub duration_ms: u64,
}

impl AttemptRecord {
    /// Create a record
    #[must_use]
    pub fn new(step: impl Into<String>, outcome: AttemptOutcome, duration_ms: u64) -> Self {
        Self {
            step: step.into(),
            outcome,
            reason: None,
            duration_ms,
        }
    }

    /// With failure reason
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Terminal rendered artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub content: String,
    pub strategy_used: StrategyKind,
    /// Primary sub-step that produced the content (primary strategy only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_step: Option<PrimaryStep>,
    pub confidence: f64,
    /// Below the configured minimum confidence; returned, not rejected
    pub low_confidence: bool,
    /// Template paths that had no value and were filled by a default
    pub unresolved_fields: BTreeSet<String>,
    pub template_path: ResolutionPath,
    pub duration_ms: u64,
    pub cache_hit: bool,
    pub attempts: Vec<AttemptRecord>,
}

impl RenderedDocument {
    /// Whether the emergency strategy produced this document
    #[inline]
    #[must_use]
    pub fn is_emergency(&self) -> bool {
        self.strategy_used == StrategyKind::Emergency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_kind_parse_is_canonical_only() {
        assert_eq!("primary".parse::<StrategyKind>().unwrap(), StrategyKind::Primary);
        assert_eq!("emergency".parse::<StrategyKind>().unwrap(), StrategyKind::Emergency);
        assert!("fallback".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn primary_steps_are_ordered() {
        assert_eq!(
            PrimaryStep::ORDER.map(PrimaryStep::as_str),
            ["context-guided", "summary-only", "raw-description"]
        );
    }

    #[test]
    fn attempt_record_serializes_without_empty_reason() {
        let rec = AttemptRecord::new("emergency", AttemptOutcome::Succeeded, 3);
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("reason").is_none());
        let rec = rec.with_reason("forced");
        assert_eq!(serde_json::to_value(&rec).unwrap()["reason"], "forced");
    }
}
