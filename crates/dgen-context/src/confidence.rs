//! Weighted overall confidence

use crate::error::ContextError;
use dgen_model::{AnalyzerId, AnalyzerResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight applied to analyzers missing from the table
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Per-analyzer confidence weights
///
/// Unlisted analyzers weigh [`DEFAULT_WEIGHT`]. A weight `<= 0` excludes the
/// analyzer from the mean without failing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfidenceWeights {
    weights: BTreeMap<AnalyzerId, f64>,
}

impl ConfidenceWeights {
    /// Equal weights for every analyzer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the weight of one analyzer
    ///
    /// # Errors
    /// `ContextError::InvalidWeight` if `weight` is NaN or infinite.
    pub fn with_weight(
        mut self,
        analyzer: impl Into<AnalyzerId>,
        weight: f64,
    ) -> Result<Self, ContextError> {
        let analyzer = analyzer.into();
        if !weight.is_finite() {
            return Err(ContextError::InvalidWeight { analyzer, weight });
        }
        self.weights.insert(analyzer, weight);
        Ok(self)
    }

    /// Check every weight is finite
    ///
    /// # Errors
    /// `ContextError::InvalidWeight` naming the first bad entry.
    pub fn validate(&self) -> Result<(), ContextError> {
        match self.weights.iter().find(|(_, w)| !w.is_finite()) {
            Some((analyzer, weight)) => Err(ContextError::InvalidWeight {
                analyzer: analyzer.clone(),
                weight: *weight,
            }),
            None => Ok(()),
        }
    }

    /// Weight of one analyzer
    #[must_use]
    pub fn weight(&self, analyzer: &AnalyzerId) -> f64 {
        self.weights.get(analyzer).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    /// Weighted mean confidence over successful results only
    ///
    /// Returns 0 when nothing succeeded or every success has weight `<= 0`.
    #[must_use]
    pub fn overall<'a>(&self, results: impl IntoIterator<Item = &'a AnalyzerResult>) -> f64 {
        let (sum, total) = results
            .into_iter()
            .filter(|r| r.is_success())
            .map(|r| (r.confidence, self.weight(&r.analyzer_id)))
            .filter(|(_, w)| w.is_finite() && *w > 0.0)
            .fold((0.0, 0.0), |(sum, total), (c, w)| (sum + c * w, total + w));

        if total > 0.0 {
            (sum / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
