use async_trait::async_trait;
use chrono::Utc;
use dgen_generation::{AiError, AiProvider, GenerationOrchestrator};
use dgen_model::{
    AnalysisData, AnalyzerResult, ComplexityBand, ComputedMetrics, Context, DesignSummary,
    EffortEstimate, Fingerprint, Priority, ResolutionTier, StrategyKind,
};
use dgen_template::builtin::builtin_document_types;
use dgen_template::{MemoryTemplateSource, TemplateResolver};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct Unavailable;

#[async_trait]
impl AiProvider for Unavailable {
    async fn is_available(&self) -> bool {
        false
    }

    async fn generate(&self, _prompt: &str, _max_timeout: Duration) -> Result<String, AiError> {
        panic!("generate must not be called when the provider is unavailable");
    }
}

fn context(title: &str, description: Option<&str>, sections: Vec<AnalyzerResult>) -> Context {
    Context {
        fingerprint: Fingerprint::compute(title.as_bytes()),
        summary: DesignSummary {
            title: title.to_string(),
            description: description.map(str::to_string),
            file_id: "file-1".into(),
            ..DesignSummary::default()
        },
        sections: sections
            .into_iter()
            .map(|r| (r.analyzer_id.clone(), r))
            .collect::<BTreeMap<_, _>>(),
        overall_confidence: 0.0,
        computed_metrics: ComputedMetrics {
            complexity: 1.0,
            complexity_band: ComplexityBand::Low,
            priority: Priority::Low,
            estimated_effort: EffortEstimate {
                story_points: 2,
                label: "1-2 days".into(),
            },
        },
        created_at: Utc::now(),
    }
}

fn orchestrator(source: MemoryTemplateSource) -> (TemplateResolver, GenerationOrchestrator) {
    let resolver = TemplateResolver::from_source(Arc::new(source));
    let orchestrator = GenerationOrchestrator::new(resolver.clone()).with_provider(Arc::new(Unavailable));
    (resolver, orchestrator)
}

#[tokio::test]
async fn test_unavailable_ai_uses_emergency_for_every_builtin() {
    let (resolver, orchestrator) = orchestrator(MemoryTemplateSource::new());
    let ctx = context("Checkout", None, vec![]);

    for doc_type in builtin_document_types() {
        let template = resolver.resolve("jira", doc_type, "react").await.unwrap();
        let doc = orchestrator.generate(&ctx, &template, None).await.unwrap();

        assert_eq!(doc.strategy_used, StrategyKind::Emergency, "{doc_type}");
        assert!(doc.unresolved_fields.is_empty(), "{doc_type}: {:?}", doc.unresolved_fields);
        assert!(!doc.content.contains("{{"), "{doc_type}");
        assert!(!doc.content.contains("{%"), "{doc_type}");
        assert!(doc.content.contains("Checkout"), "{doc_type}");
        assert_eq!(doc.confidence, 0.0);
        assert!(doc.low_confidence);
    }
}

#[tokio::test]
async fn test_custom_template_missing_required_field_falls_back_to_builtin() {
    let source = MemoryTemplateSource::new().with_template(
        "jira/ticket/generic",
        "---\nrequired_fields: [title, owner_signoff]\n---\n# {{ title }}\n",
    );
    let (resolver, orchestrator) = orchestrator(source);
    let template = resolver.resolve("jira", "ticket", "").await.unwrap();
    assert_eq!(template.tier(), ResolutionTier::PlatformGeneric);

    let doc = orchestrator
        .generate(&context("Login", Some("Sign-in"), vec![]), &template, None)
        .await
        .unwrap();

    assert_eq!(doc.template_path.tier, ResolutionTier::BuiltIn);
    assert!(doc.unresolved_fields.is_empty());
    assert!(doc.content.contains("## Acceptance Criteria"));
    assert_eq!(doc.attempts.len(), 2);
}

#[tokio::test]
async fn test_custom_template_renders_with_defaults_in_emergency() {
    let source = MemoryTemplateSource::new().with_template(
        "custom/defaults/release-note",
        "---\nrequired_fields: [title, summary]\n---\n# {{ title }}\n{{ summary }}\nOwner: {{ assignee }}\n",
    );
    let (resolver, orchestrator) = orchestrator(source);
    let template = resolver.resolve("notion", "release-note", "go").await.unwrap();
    let ctx = context(
        "Dashboard",
        None,
        vec![AnalyzerResult::success("domain", 0.9, AnalysisData::Custom(json!({"x": 1})))],
    );

    let doc = orchestrator.generate(&ctx, &template, None).await.unwrap();

    assert_eq!(doc.template_path.location, "custom/defaults/release-note");
    assert_eq!(doc.content, "# Dashboard\nDashboard\nOwner: Unassigned\n");
    assert!(doc.unresolved_fields.is_empty());
}

#[tokio::test]
async fn test_field_inside_taken_branch_keeps_custom_template() {
    let source = MemoryTemplateSource::new().with_template(
        "jira/ticket/react",
        "---\nrequired_fields: [title]\n---\n# {{ title }}\n{% if title %}Owner: {{ owner }}{% endif %}\n",
    );
    let (resolver, orchestrator) = orchestrator(source);
    let template = resolver.resolve("jira", "ticket", "react").await.unwrap();
    assert_eq!(template.tier(), ResolutionTier::TechSpecific);

    let doc = orchestrator
        .generate(&context("Login", None, vec![]), &template, None)
        .await
        .unwrap();

    assert_eq!(doc.template_path.tier, ResolutionTier::TechSpecific);
    assert_eq!(doc.attempts.len(), 1);
    assert!(doc.unresolved_fields.is_empty());
    assert!(doc.content.starts_with("# Login\nOwner: "));
    assert!(!doc.content.contains("{{"));
}

proptest! {
    #[test]
    fn prop_emergency_never_leaves_placeholders(
        title in "[A-Za-z ]{0,30}",
        description in proptest::option::of("[A-Za-z .]{0,60}"),
        doc_type in "(ticket|story|documentation|test-plan|anything)",
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let (resolver, orchestrator) = orchestrator(MemoryTemplateSource::new());
        let ctx = context(&title, description.as_deref(), vec![]);
        let doc = rt.block_on(async {
            let template = resolver.resolve("jira", &doc_type, "").await.unwrap();
            orchestrator.generate(&ctx, &template, None).await.unwrap()
        });
        prop_assert!(doc.unresolved_fields.is_empty());
        prop_assert!(!doc.content.contains("{{"));
        prop_assert!(!doc.content.to_lowercase().contains("not found"));
    }
}
