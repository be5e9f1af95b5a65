//! Colour, typography and effect style usage

use crate::analyzer::Analyzer;
use async_trait::async_trait;
use dgen_model::{
    AnalysisData, AnalyzerId, AnalyzerResult, ColorToken, RawInput, StyleAnalysis,
    StyleDefinition, StyleKind,
};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Section id of [`StyleAnalyzer`]
pub const STYLE_ANALYZER_ID: &str = "styles";

/// Collects the styles actually referenced by the selection
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleAnalyzer;

impl StyleAnalyzer {
    /// Analyze synchronously
    #[must_use]
    pub fn inspect(input: &RawInput) -> AnalyzerResult {
        if input.nodes.is_empty() {
            return AnalyzerResult::failed(STYLE_ANALYZER_ID, "selection contains no nodes");
        }

        let known: BTreeMap<&str, &StyleDefinition> =
            input.styles.iter().map(|s| (s.id.as_str(), s)).collect();

        let mut used: BTreeSet<&str> = BTreeSet::new();
        let mut styled = 0usize;
        let mut unstyled = 0usize;
        for (_, node) in input.walk() {
            let refs: Vec<&str> = node
                .style_refs
                .iter()
                .map(String::as_str)
                .filter(|id| known.contains_key(id))
                .collect();
            if refs.is_empty() {
                unstyled += 1;
            } else {
                styled += 1;
                used.extend(refs);
            }
        }

        let mut colors = BTreeSet::new();
        let mut typography = BTreeSet::new();
        let mut effects = BTreeSet::new();
        for style in used.iter().filter_map(|id| known.get(id)) {
            match style.kind {
                StyleKind::Fill => {
                    colors.insert((style.name.clone(), style.value.clone().unwrap_or_default()));
                }
                StyleKind::Text => {
                    typography.insert(style.name.clone());
                }
                StyleKind::Effect => {
                    effects.insert(style.name.clone());
                }
                StyleKind::Grid => {}
            }
        }

        let data = StyleAnalysis {
            colors: colors
                .into_iter()
                .map(|(name, value)| ColorToken { name, value })
                .collect(),
            typography: typography.into_iter().collect(),
            effects: effects.into_iter().collect(),
            unstyled_nodes: unstyled,
        };

        #[allow(clippy::cast_precision_loss)]
        let coverage = styled as f64 / (styled + unstyled).max(1) as f64;
        AnalyzerResult::success(STYLE_ANALYZER_ID, 0.3 + 0.6 * coverage, AnalysisData::Styles(data))
    }
}

#[async_trait]
impl Analyzer for StyleAnalyzer {
    fn id(&self) -> AnalyzerId {
        AnalyzerId::from(STYLE_ANALYZER_ID)
    }

    async fn analyze(&self, input: &RawInput, _timeout: Duration) -> AnalyzerResult {
        Self::inspect(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgen_model::{DesignNode, NodeType};
    use pretty_assertions::assert_eq;

    fn styled_input() -> RawInput {
        RawInput::new("f")
            .with_nodes(vec![DesignNode::new("1", "Card", NodeType::Frame)
                .with_styles(["s-fill", "s-shadow"])
                .with_children(vec![
                    DesignNode::new("2", "Heading", NodeType::Text).with_styles(["s-h1"]),
                    DesignNode::new("3", "Divider", NodeType::Rectangle),
                ])])
            .with_styles(vec![
                StyleDefinition::new("s-fill", "Brand/Primary", StyleKind::Fill).with_value("#0055ff"),
                StyleDefinition::new("s-h1", "Heading/H1", StyleKind::Text),
                StyleDefinition::new("s-shadow", "Elevation/1", StyleKind::Effect),
                StyleDefinition::new("s-unused", "Brand/Unused", StyleKind::Fill),
            ])
    }

    #[test]
    fn reports_referenced_styles_by_kind() {
        let result = StyleAnalyzer::inspect(&styled_input());
        assert!(result.is_success());
        let AnalysisData::Styles(data) = result.data else {
            panic!("expected style data");
        };
        assert_eq!(
            data.colors,
            vec![ColorToken {
                name: "Brand/Primary".into(),
                value: "#0055ff".into()
            }]
        );
        assert_eq!(data.typography, vec!["Heading/H1".to_string()]);
        assert_eq!(data.effects, vec!["Elevation/1".to_string()]);
        assert_eq!(data.unstyled_nodes, 1);
    }

    #[test]
    fn confidence_tracks_style_coverage() {
        let full = StyleAnalyzer::inspect(&styled_input()).confidence;
        let none = StyleAnalyzer::inspect(
            &RawInput::new("f").with_nodes(vec![DesignNode::new("1", "A", NodeType::Frame)]),
        )
        .confidence;
        assert!(full > none);
        assert!((none - 0.3).abs() < 1e-9);
    }

    #[test]
    fn unknown_style_refs_are_ignored() {
        let input = RawInput::new("f")
            .with_nodes(vec![DesignNode::new("1", "A", NodeType::Frame).with_styles(["missing"])]);
        let AnalysisData::Styles(data) = StyleAnalyzer::inspect(&input).data else {
            panic!("expected style data");
        };
        assert!(data.colors.is_empty());
        assert_eq!(data.unstyled_nodes, 1);
    }
}
