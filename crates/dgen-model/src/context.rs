//! Unified design context
//!
//! A [`Context`] is the fan-in of every analyzer's result for one
//! [`RawInput`](crate::RawInput), plus a deterministic summary of the
//! selection and metrics computed from the successful sections. It is
//! assembled completely before anything downstream sees it.

use crate::analysis::{AnalysisData, AnalyzerId, AnalyzerResult, StructureAnalysis};
use crate::fingerprint::Fingerprint;
use crate::input::RawInput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Unified, read-mostly context passed downstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Fingerprint of the originating input (cache key)
    pub fingerprint: Fingerprint,
    /// Deterministic summary of the selection
    pub summary: DesignSummary,
    /// One result per registered analyzer
    pub sections: BTreeMap<AnalyzerId, AnalyzerResult>,
    /// Weighted mean confidence over successful analyzers (0 if none)
    pub overall_confidence: f64,
    /// Metrics derived from successful sections
    pub computed_metrics: ComputedMetrics,
    /// Assembly time
    pub created_at: DateTime<Utc>,
}

impl Context {
    /// Successful sections only
    pub fn successful_sections(&self) -> impl Iterator<Item = &AnalyzerResult> {
        self.sections.values().filter(|r| r.is_success())
    }

    /// Number of successful sections
    #[must_use]
    pub fn successful_count(&self) -> usize {
        self.successful_sections().count()
    }

    /// Look up one section
    #[inline]
    #[must_use]
    pub fn section(&self, id: &AnalyzerId) -> Option<&AnalyzerResult> {
        self.sections.get(id)
    }

    /// Structure data from the first successful structure section
    #[must_use]
    pub fn structure(&self) -> Option<&StructureAnalysis> {
        self.successful_sections().find_map(|r| match &r.data {
            AnalysisData::Structure(s) => Some(s),
            _ => None,
        })
    }

    /// Render scope for templates
    ///
    /// Layout:
    /// - `title`, `description`, `design.*`: selection summary
    /// - `metrics.*`: complexity, band, priority, effort
    /// - `confidence`: overall confidence
    /// - `sections.<id>.{status,confidence,data}`: every analyzer result
    /// - `<id>.*`: data of each successful analyzer, addressed by its id
    #[must_use]
    pub fn to_scope(&self) -> Value {
        let mut scope = Map::new();

        for result in self.successful_sections() {
            scope.insert(result.analyzer_id.to_string(), result.data.to_value());
        }

        let sections: Map<String, Value> = self
            .sections
            .iter()
            .map(|(id, r)| {
                (
                    id.to_string(),
                    json!({
                        "status": r.status,
                        "confidence": r.confidence,
                        "data": r.data.to_value(),
                        "error": r.error,
                    }),
                )
            })
            .collect();
        scope.insert("sections".into(), Value::Object(sections));

        scope.insert("title".into(), Value::String(self.summary.title.clone()));
        if let Some(description) = &self.summary.description {
            scope.insert("description".into(), Value::String(description.clone()));
        }
        scope.insert("design".into(), self.summary.to_value());
        scope.insert("metrics".into(), self.computed_metrics.to_value());
        scope.insert("confidence".into(), json!(self.overall_confidence));
        scope.insert("fingerprint".into(), Value::String(self.fingerprint.short()));

        Value::Object(scope)
    }
}

/// Deterministic summary of the selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignSummary {
    pub title: String,
    pub description: Option<String>,
    pub file_id: String,
    pub page: Option<String>,
    pub node_count: usize,
    pub component_names: Vec<String>,
    pub text_samples: Vec<String>,
}

impl DesignSummary {
    /// Maximum text samples kept in the summary
    pub const MAX_TEXT_SAMPLES: usize = 8;

    /// Summarize a raw input
    #[must_use]
    pub fn from_input(input: &RawInput) -> Self {
        Self {
            title: input.title(),
            description: input
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            file_id: input.file_id.clone(),
            page: input.selection.page.clone(),
            node_count: input.node_count(),
            component_names: input.component_names().into_iter().collect(),
            text_samples: input
                .text_content()
                .into_iter()
                .take(Self::MAX_TEXT_SAMPLES)
                .map(str::to_string)
                .collect(),
        }
    }

    fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Metrics derived from successful sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedMetrics {
    /// Complexity score in `[1, 10]`
    pub complexity: f64,
    pub complexity_band: ComplexityBand,
    pub priority: Priority,
    pub estimated_effort: EffortEstimate,
}

impl ComputedMetrics {
    fn to_value(&self) -> Value {
        json!({
            "complexity": self.complexity,
            "complexity_band": self.complexity_band.as_str(),
            "priority": self.priority.as_str(),
            "effort": self.estimated_effort.label,
            "story_points": self.estimated_effort.story_points,
        })
    }
}

/// Complexity band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplexityBand {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityBand {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very-high",
        }
    }
}

impl fmt::Display for ComplexityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effort estimate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffortEstimate {
    pub story_points: u8,
    /// Human label (e.g. `3-5 days`)
    pub label: String,
}
