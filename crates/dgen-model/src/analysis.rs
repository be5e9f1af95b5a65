//! Analyzer results
//!
//! Every analyzer produces exactly one [`AnalyzerResult`] per request. The
//! partial data it carries is a closed set of tagged variants
//! ([`AnalysisData`]) rather than an untyped object, so downstream code can
//! match on what each facet actually contains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Stable analyzer identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalyzerId(String);

impl AnalyzerId {
    /// Create an analyzer id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnalyzerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnalyzerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AnalyzerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Outcome of one analyzer run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerStatus {
    /// Analyzer produced data
    Success,
    /// Analyzer errored, panicked or returned malformed data
    Failed,
    /// Analyzer exceeded its time budget
    Timeout,
}

/// Result of one analyzer for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerResult {
    /// Producing analyzer
    pub analyzer_id: AnalyzerId,
    /// Outcome
    pub status: AnalyzerStatus,
    /// Confidence in `[0, 1]`; always 0 unless `status == Success`
    pub confidence: f64,
    /// Typed partial result
    pub data: AnalysisData,
    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalyzerResult {
    /// Successful result; confidence is clamped into `[0, 1]`
    #[must_use]
    pub fn success(analyzer_id: impl Into<AnalyzerId>, confidence: f64, data: AnalysisData) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            analyzer_id: analyzer_id.into(),
            status: AnalyzerStatus::Success,
            confidence,
            data,
            error: None,
        }
    }

    /// Failed result with zero confidence
    #[must_use]
    pub fn failed(analyzer_id: impl Into<AnalyzerId>, error: impl Into<String>) -> Self {
        Self {
            analyzer_id: analyzer_id.into(),
            status: AnalyzerStatus::Failed,
            confidence: 0.0,
            data: AnalysisData::Empty,
            error: Some(error.into()),
        }
    }

    /// Timed-out result with zero confidence
    #[must_use]
    pub fn timed_out(analyzer_id: impl Into<AnalyzerId>, after: Duration) -> Self {
        Self {
            analyzer_id: analyzer_id.into(),
            status: AnalyzerStatus::Timeout,
            confidence: 0.0,
            data: AnalysisData::Empty,
            error: Some(format!("timed out after {}ms", after.as_millis())),
        }
    }

    /// Whether the analyzer succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == AnalyzerStatus::Success
    }

    /// Check the result for shape violations
    ///
    /// # Errors
    /// Returns a description of the first violation found.
    pub fn check_well_formed(&self, expected: &AnalyzerId) -> Result<(), String> {
        if &self.analyzer_id != expected {
            return Err(format!(
                "result reported analyzer '{}' but was produced by '{}'",
                self.analyzer_id, expected
            ));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} outside [0, 1]", self.confidence));
        }
        if self.is_success() && matches!(self.data, AnalysisData::Empty) {
            return Err("successful result carried no data".to_string());
        }
        Ok(())
    }
}

/// Typed partial result of one analysis facet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnalysisData {
    /// Tree shape and interactivity
    Structure(StructureAnalysis),
    /// Colour, typography and effect usage
    Styles(StyleAnalysis),
    /// Accessibility findings
    Accessibility(AccessibilityAnalysis),
    /// Business-domain inference
    Domain(DomainAnalysis),
    /// Plug-in specific payload
    Custom(serde_json::Value),
    /// No data (failed or timed-out analyzers)
    Empty,
}

impl AnalysisData {
    /// Convert to a JSON value for template rendering
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Self::Structure(s) => serde_json::to_value(s),
            Self::Styles(s) => serde_json::to_value(s),
            Self::Accessibility(a) => serde_json::to_value(a),
            Self::Domain(d) => serde_json::to_value(d),
            Self::Custom(v) => Ok(v.clone()),
            Self::Empty => Ok(serde_json::Value::Null),
        }
        .unwrap_or(serde_json::Value::Null)
    }
}

/// Structural facts about the selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureAnalysis {
    pub node_count: usize,
    pub max_depth: usize,
    pub interaction_types: Vec<String>,
    pub variant_count: usize,
    pub component_names: Vec<String>,
    pub text_layers: usize,
}

/// Style usage across the selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleAnalysis {
    pub colors: Vec<ColorToken>,
    pub typography: Vec<String>,
    pub effects: Vec<String>,
    /// Nodes that reference no style at all
    pub unstyled_nodes: usize,
}

/// A named colour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorToken {
    pub name: String,
    pub value: String,
}

/// Accessibility findings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityAnalysis {
    pub issues: Vec<String>,
    /// Target conformance level (e.g. `AA`)
    pub level: Option<String>,
}

/// Business-domain inference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainAnalysis {
    pub domain: String,
    pub user_stories: Vec<String>,
    pub keywords: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_clamps_confidence() {
        let r = AnalyzerResult::success("structure", 1.7, AnalysisData::Custom(1.into()));
        assert_eq!(r.confidence, 1.0);
        let r = AnalyzerResult::success("structure", f64::NAN, AnalysisData::Custom(1.into()));
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn failures_have_zero_confidence() {
        let f = AnalyzerResult::failed("visual", "boom");
        assert_eq!(f.status, AnalyzerStatus::Failed);
        assert_eq!(f.confidence, 0.0);
        assert_eq!(f.error.as_deref(), Some("boom"));

        let t = AnalyzerResult::timed_out("visual", Duration::from_millis(1500));
        assert_eq!(t.status, AnalyzerStatus::Timeout);
        assert_eq!(t.error.as_deref(), Some("timed out after 1500ms"));
    }

    #[test]
    fn well_formed_checks() {
        let id = AnalyzerId::new("structure");
        let ok = AnalyzerResult::success("structure", 0.5, AnalysisData::Custom(1.into()));
        assert!(ok.check_well_formed(&id).is_ok());

        let wrong_id = AnalyzerResult::success("other", 0.5, AnalysisData::Custom(1.into()));
        assert!(wrong_id.check_well_formed(&id).is_err());

        let mut out_of_range = ok.clone();
        out_of_range.confidence = 3.0;
        assert!(out_of_range.check_well_formed(&id).is_err());

        let mut empty = ok;
        empty.data = AnalysisData::Empty;
        assert!(empty.check_well_formed(&id).is_err());
    }

    #[test]
    fn analysis_data_is_tagged_on_the_wire() {
        let data = AnalysisData::Domain(DomainAnalysis {
            domain: "payments".into(),
            ..DomainAnalysis::default()
        });
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["kind"], "domain");
        assert_eq!(json["value"]["domain"], "payments");
        assert_eq!(data.to_value()["domain"], "payments");
    }
}
