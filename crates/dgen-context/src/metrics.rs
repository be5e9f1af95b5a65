//! Computed metrics
//!
//! Pure functions of the successful `structure` section. Without one the
//! score sits at the floor and every step function takes its lowest value.

use crate::analyzers::STRUCTURE_ANALYZER_ID;
use dgen_model::{
    AnalysisData, AnalyzerResult, ComplexityBand, ComputedMetrics, EffortEstimate, Priority,
    StructureAnalysis,
};

/// Lowest complexity score
pub const MIN_COMPLEXITY: f64 = 1.0;
/// Highest complexity score
pub const MAX_COMPLEXITY: f64 = 10.0;

/// Complexity score for a structure analysis, in `[1, 10]`
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn complexity_score(structure: &StructureAnalysis) -> f64 {
    let nodes = (structure.node_count as f64 / 10.0).min(4.0);
    let interactions = (0.75 * structure.interaction_types.len() as f64).min(2.5);
    let depth = (0.5 * structure.max_depth.saturating_sub(1) as f64).min(2.0);
    let variants = (0.5 * structure.variant_count as f64).min(1.5);
    (MIN_COMPLEXITY + nodes + interactions + depth + variants).clamp(MIN_COMPLEXITY, MAX_COMPLEXITY)
}

/// Band of a complexity score
#[must_use]
pub fn band(score: f64) -> ComplexityBand {
    if score < 3.0 {
        ComplexityBand::Low
    } else if score < 5.5 {
        ComplexityBand::Medium
    } else if score < 8.0 {
        ComplexityBand::High
    } else {
        ComplexityBand::VeryHigh
    }
}

/// Priority of a band
#[must_use]
pub const fn priority(band: ComplexityBand) -> Priority {
    match band {
        ComplexityBand::Low => Priority::Low,
        ComplexityBand::Medium => Priority::Medium,
        ComplexityBand::High => Priority::High,
        ComplexityBand::VeryHigh => Priority::Critical,
    }
}

/// Effort estimate of a band
#[must_use]
pub fn effort(band: ComplexityBand) -> EffortEstimate {
    let (story_points, label) = match band {
        ComplexityBand::Low => (2, "1-2 days"),
        ComplexityBand::Medium => (5, "3-5 days"),
        ComplexityBand::High => (8, "1-2 weeks"),
        ComplexityBand::VeryHigh => (13, "2+ weeks"),
    };
    EffortEstimate {
        story_points,
        label: label.to_string(),
    }
}

/// Compute metrics from analyzer results; failed sections are ignored
#[must_use]
pub fn compute_metrics<'a>(results: impl IntoIterator<Item = &'a AnalyzerResult>) -> ComputedMetrics {
    let complexity = results
        .into_iter()
        .filter(|r| r.is_success() && r.analyzer_id.as_str() == STRUCTURE_ANALYZER_ID)
        .find_map(|r| match &r.data {
            AnalysisData::Structure(s) => Some(complexity_score(s)),
            _ => None,
        })
        .unwrap_or(MIN_COMPLEXITY);

    let complexity_band = band(complexity);
    ComputedMetrics {
        complexity,
        complexity_band,
        priority: priority(complexity_band),
        estimated_effort: effort(complexity_band),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn structure(nodes: usize, interactions: usize, depth: usize, variants: usize) -> StructureAnalysis {
        StructureAnalysis {
            node_count: nodes,
            max_depth: depth,
            interaction_types: (0..interactions).map(|i| format!("t{i}")).collect(),
            variant_count: variants,
            ..StructureAnalysis::default()
        }
    }

    #[test]
    fn score_follows_formula() {
        // 1 + 1.2 + 0.75 + 0.5 + 1.0
        let score = complexity_score(&structure(12, 1, 2, 2));
        assert!((score - 4.45).abs() < 1e-9);
        assert_eq!(band(score), ComplexityBand::Medium);
    }

    #[test]
    fn score_is_capped() {
        let score = complexity_score(&structure(1000, 50, 40, 40));
        assert!((score - 10.0).abs() < 1e-9);
        assert_eq!(band(score), ComplexityBand::VeryHigh);
        assert_eq!(priority(band(score)), Priority::Critical);
        assert_eq!(effort(band(score)).story_points, 13);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(band(2.999), ComplexityBand::Low);
        assert_eq!(band(3.0), ComplexityBand::Medium);
        assert_eq!(band(5.5), ComplexityBand::High);
        assert_eq!(band(8.0), ComplexityBand::VeryHigh);
    }

    #[test]
    fn floor_without_structure_section() {
        let metrics = compute_metrics(&[AnalyzerResult::failed(STRUCTURE_ANALYZER_ID, "boom")]);
        assert_eq!(metrics.complexity, MIN_COMPLEXITY);
        assert_eq!(metrics.complexity_band, ComplexityBand::Low);
        assert_eq!(metrics.priority, Priority::Low);
        assert_eq!(metrics.estimated_effort.label, "1-2 days");
    }

    #[test]
    fn uses_successful_structure_section() {
        let ok = AnalyzerResult::success(
            STRUCTURE_ANALYZER_ID,
            0.9,
            AnalysisData::Structure(structure(30, 2, 3, 0)),
        );
        let metrics = compute_metrics(&[ok]);
        // 1 + 3 + 1.5 + 1
        assert!((metrics.complexity - 6.5).abs() < 1e-9);
        assert_eq!(metrics.priority, Priority::High);
    }

    proptest! {
        #[test]
        fn prop_score_in_range(n in 0usize..10_000, i in 0usize..100, d in 0usize..100, v in 0usize..100) {
            let score = complexity_score(&structure(n, i, d, v));
            prop_assert!((MIN_COMPLEXITY..=MAX_COMPLEXITY).contains(&score));
        }
    }
}
