//! Tree shape, interactivity and component analysis

use crate::analyzer::Analyzer;
use async_trait::async_trait;
use dgen_model::{AnalysisData, AnalyzerId, AnalyzerResult, RawInput, StructureAnalysis};
use std::time::Duration;

/// Section id of [`StructureAnalyzer`]
pub const STRUCTURE_ANALYZER_ID: &str = "structure";

/// Counts nodes, depth, interactions, variants and components
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureAnalyzer;

impl StructureAnalyzer {
    /// Analyze synchronously
    #[must_use]
    pub fn inspect(input: &RawInput) -> AnalyzerResult {
        if input.nodes.is_empty() {
            return AnalyzerResult::failed(STRUCTURE_ANALYZER_ID, "selection contains no nodes");
        }

        let data = StructureAnalysis {
            node_count: input.node_count(),
            max_depth: input.max_depth(),
            interaction_types: input.interaction_types().into_iter().collect(),
            variant_count: input.variant_count(),
            component_names: input.component_names().into_iter().collect(),
            text_layers: input.text_content().len(),
        };
        let confidence = richness(&data);
        AnalyzerResult::success(STRUCTURE_ANALYZER_ID, confidence, AnalysisData::Structure(data))
    }
}

/// Confidence grows with how much the tree tells us
fn richness(data: &StructureAnalysis) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let size = (data.node_count as f64 / 50.0).min(0.2);
    let mut confidence = 0.5 + size;
    if !data.component_names.is_empty() {
        confidence += 0.1;
    }
    if data.text_layers > 0 {
        confidence += 0.1;
    }
    if !data.interaction_types.is_empty() {
        confidence += 0.1;
    }
    confidence.min(1.0)
}

#[async_trait]
impl Analyzer for StructureAnalyzer {
    fn id(&self) -> AnalyzerId {
        AnalyzerId::from(STRUCTURE_ANALYZER_ID)
    }

    async fn analyze(&self, input: &RawInput, _timeout: Duration) -> AnalyzerResult {
        Self::inspect(input)
    }
}
