use dgen_core::{DesignPipeline, GenerateRequest, PipelineConfig};
use dgen_generation::AiError;
use dgen_model::{AttemptOutcome, PrimaryStep, ResolutionTier, StrategyKind};
use dgen_template::MemoryTemplateSource;
use dgen_test_utils::*;
use pretty_assertions::assert_eq;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn three_analyzers() -> dgen_context::AnalyzerRegistry {
    create_scripted_registry(&[
        ("visual", Script::Succeed(0.9)),
        ("domain", Script::Succeed(0.8)),
        ("accessibility", Script::Succeed(0.7)),
    ])
}

#[tokio::test]
async fn test_full_success_uses_context_guided_step() {
    let provider = Arc::new(ScriptedProvider::available().with_response(create_ticket_json_response()));
    let pipeline = setup_test_pipeline(three_analyzers(), provider.clone());

    let request = GenerateRequest::new(create_login_input(), "jira", "ticket", "react");
    let document = pipeline.generate(&request).await.unwrap();

    assert_eq!(document.strategy_used, StrategyKind::Primary);
    assert_eq!(document.primary_step, Some(PrimaryStep::ContextGuided));
    assert!((document.confidence - 0.8).abs() < 1e-9);
    assert!(!document.low_confidence);
    assert_eq!(document.template_path.tier, ResolutionTier::TechSpecific);
    assert!(document.content.starts_with("# Login (React)"));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_total_analyzer_failure_reaches_raw_description() {
    let registry = create_scripted_registry(&[("visual", Script::Fail), ("domain", Script::Panic)]);
    let provider = Arc::new(ScriptedProvider::available().with_fallback(create_ticket_markdown_response()));
    let pipeline =
        setup_test_pipeline_with(registry, provider.clone(), Arc::new(MemoryTemplateSource::new()));

    let request = GenerateRequest::new(create_login_input(), "jira", "ticket", "react");
    let document = pipeline.generate(&request).await.unwrap();

    assert_eq!(document.strategy_used, StrategyKind::Primary);
    assert_eq!(document.primary_step, Some(PrimaryStep::RawDescription));
    assert_eq!(document.confidence, 0.0);
    assert!(document.low_confidence);
    let outcomes: Vec<_> = document.attempts.iter().map(|a| a.outcome).collect();
    assert_eq!(
        outcomes,
        vec![AttemptOutcome::Skipped, AttemptOutcome::Skipped, AttemptOutcome::Succeeded]
    );
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_unavailable_ai_produces_complete_emergency_document() {
    let provider = Arc::new(ScriptedProvider::unavailable());
    let pipeline =
        setup_test_pipeline_with(three_analyzers(), provider.clone(), Arc::new(MemoryTemplateSource::new()));

    for doc_type in ["ticket", "story", "documentation", "test-plan"] {
        let request = GenerateRequest::new(create_checkout_input(), "jira", doc_type, "react");
        let document = pipeline.generate(&request).await.unwrap();
        assert_eq!(document.strategy_used, StrategyKind::Emergency, "{doc_type}");
        assert!(document.unresolved_fields.is_empty(), "{doc_type}");
        assert!(!document.content.contains("{{"), "{doc_type}");
        assert!((document.confidence - 0.4).abs() < 1e-9, "{doc_type}");
    }
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_failing_primary_steps_fall_through_to_emergency() {
    let provider = Arc::new(
        ScriptedProvider::available()
            .with_response("not json at all")
            .with_error(AiError::Provider("rate limited".into()))
            .with_response("{{ title }}"),
    );
    let pipeline = setup_test_pipeline(three_analyzers(), provider.clone());

    let request = GenerateRequest::new(create_login_input(), "jira", "ticket", "react");
    let document = pipeline.generate(&request).await.unwrap();

    assert_eq!(document.strategy_used, StrategyKind::Emergency);
    assert!(document.unresolved_fields.is_empty());
    assert_eq!(provider.calls(), 3);
    let outcomes: Vec<_> = document.attempts.iter().map(|a| a.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            AttemptOutcome::ValidationFailed,
            AttemptOutcome::ProviderFailed,
            AttemptOutcome::ValidationFailed,
            AttemptOutcome::Succeeded,
        ]
    );
}

#[tokio::test]
async fn test_unknown_tech_stack_uses_custom_default_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom/defaults/ticket.tpl");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "---\nrequired_fields: [title]\n---\n# {{ title }}\nStack: {{ design.file_id }}\n").unwrap();

    let pipeline = DesignPipeline::new(PipelineConfig::new().with_template_root(dir.path())).unwrap();
    let request = GenerateRequest::new(create_login_input(), "jira", "ticket", "cobol");
    let document = pipeline.generate(&request).await.unwrap();

    assert_eq!(document.template_path.tier, ResolutionTier::CustomDefault);
    assert_eq!(document.template_path.location, "custom/defaults/ticket");
    assert!(document.content.contains("# Login\nStack: file-login"));
}

#[tokio::test]
async fn test_legacy_strategy_name_forces_emergency() {
    let provider = Arc::new(ScriptedProvider::available().with_fallback(create_ticket_json_response()));
    let pipeline = setup_test_pipeline(three_analyzers(), provider.clone());

    let request =
        GenerateRequest::new(create_login_input(), "jira", "ticket", "react").with_strategy("fallback");
    let document = pipeline.generate(&request).await.unwrap();

    assert_eq!(document.strategy_used, StrategyKind::Emergency);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_failing_cache_never_fails_a_request() {
    let pipeline = DesignPipeline::builder(PipelineConfig::new())
        .with_registry(three_analyzers())
        .with_template_source(Arc::new(create_template_source()))
        .with_cache_backend(Arc::new(FailingCacheBackend))
        .build()
        .unwrap();

    let request = GenerateRequest::new(create_login_input(), "jira", "story", "react");
    let first = pipeline.generate_report(&request).await.unwrap();
    let second = pipeline.generate_report(&request).await.unwrap();

    assert!(!second.document.cache_hit);
    assert!(!second.context_cache_hit);
    assert_eq!(first.document.content, second.document.content);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_requests_analyze_once() {
    let analyzer = ScriptedAnalyzer::new("slow", Script::Delay(Duration::from_millis(50), 0.6));
    let counter = analyzer.counter();
    let registry = dgen_context::AnalyzerRegistry::new().with(analyzer).unwrap();
    let pipeline = setup_test_pipeline(registry, Arc::new(ScriptedProvider::unavailable()));

    let request = GenerateRequest::new(create_checkout_input(), "jira", "ticket", "");
    let handles: Vec<_> = (0..5)
        .map(|_| {
            let pipeline = pipeline.clone();
            let request = request.clone();
            tokio::spawn(async move { pipeline.generate(&request).await.unwrap() })
        })
        .collect();

    let mut contents = Vec::new();
    for handle in handles {
        contents.push(handle.await.unwrap().content);
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(contents.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_empty_selection_still_renders() {
    let pipeline = setup_test_pipeline(
        dgen_context::AnalyzerRegistry::with_builtins(),
        Arc::new(ScriptedProvider::unavailable()),
    );
    let request = GenerateRequest::new(create_empty_input(), "linear", "story", "svelte");
    let report = pipeline.generate_report(&request).await.unwrap();

    assert_eq!(report.context.successful_count(), 0);
    assert_eq!(report.document.confidence, 0.0);
    assert!(report.document.low_confidence);
    assert_eq!(report.document.template_path.tier, ResolutionTier::BuiltIn);
    assert!(report.document.content.starts_with("# file-empty"));
}

proptest::proptest! {
    #[test]
    fn prop_any_request_yields_a_document(
        platform in "[a-z]{0,12}",
        doc_type in "[a-z-]{0,12}",
        tech in "[a-z0-9]{0,12}",
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        let pipeline = setup_test_pipeline_with(
            dgen_context::AnalyzerRegistry::with_builtins(),
            Arc::new(ScriptedProvider::unavailable()),
            Arc::new(MemoryTemplateSource::new()),
        );
        let request = GenerateRequest::new(create_login_input(), platform, doc_type, tech);
        let document = rt.block_on(pipeline.generate(&request)).unwrap();
        proptest::prop_assert!(document.is_emergency());
        proptest::prop_assert!(!document.content.contains("{{"));
        proptest::prop_assert!(document.unresolved_fields.is_empty());
    }
}
