//! Layered document generation
//!
//! ```text
//! select strategy ── emergency requested / no working provider ──┐
//!        │ primary                                               │
//!        ▼                                                       ▼
//!  (a) context-guided → (b) summary-only → (c) raw-description → emergency
//! ```
//!
//! Each primary sub-step has its own timeout, capped by what is left of the
//! request budget. A sub-step fails on provider error, timeout, an empty or
//! malformed response, or missing required fields; the next one then runs.
//! The emergency strategy makes no external calls and always produces a
//! document with no unresolved fields.

use crate::emergency::{prefill, prefill_reached};
use crate::error::{AiError, GenerationError, GenerationResult, StepError};
use crate::prompt;
use crate::provider::AiProvider;
use crate::strategy::select_strategy;
use crate::validate::{has_placeholders, missing_in_markdown, missing_in_render};
use dgen_context::{CacheKey, ResultCache};
use dgen_model::{
    AttemptOutcome, AttemptRecord, Context, PrimaryStep, RenderedDocument, ResolutionPath,
    StrategyKind,
};
use dgen_template::{RenderOutput, ResolvedTemplate, TemplateRenderer, TemplateResolver};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Step name used for the emergency strategy in the attempt trail
pub const EMERGENCY_STEP: &str = "emergency";

/// Generation settings
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Bound on one AI call
    pub step_timeout: Duration,
    /// Bound on the whole primary strategy
    pub request_timeout: Duration,
    /// Confidence multiplier applied to emergency documents
    pub emergency_discount: f64,
    /// Documents whose context confidence is below this are flagged `low_confidence`
    pub min_confidence: f64,
    /// Lifetime of a cached document
    pub document_ttl: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(20),
            request_timeout: Duration::from_secs(60),
            emergency_discount: 0.5,
            min_confidence: 0.4,
            document_ttl: Duration::from_secs(600),
        }
    }
}

struct StepOutput {
    content: String,
    unresolved: BTreeSet<String>,
}

/// Runs the primary/emergency strategy chain for one resolved template
#[derive(Debug, Clone)]
pub struct GenerationOrchestrator {
    resolver: TemplateResolver,
    provider: Option<Arc<dyn AiProvider>>,
    renderer: TemplateRenderer,
    cache: Option<ResultCache>,
    config: GenerationConfig,
}

impl GenerationOrchestrator {
    /// Create orchestrator; `resolver` supplies the built-in fallback tier
    #[must_use]
    pub fn new(resolver: TemplateResolver) -> Self {
        Self {
            resolver,
            provider: None,
            renderer: TemplateRenderer::new(),
            cache: None,
            config: GenerationConfig::default(),
        }
    }

    /// Attach an AI provider
    #[inline]
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn AiProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replace the renderer (e.g. for a custom default policy)
    #[inline]
    #[must_use]
    pub fn with_renderer(mut self, renderer: TemplateRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Attach a document cache
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace settings; the discount is clamped into `[0, 1]`
    #[must_use]
    pub fn with_config(mut self, mut config: GenerationConfig) -> Self {
        config.emergency_discount = if config.emergency_discount.is_finite() {
            config.emergency_discount.clamp(0.0, 1.0)
        } else {
            GenerationConfig::default().emergency_discount
        };
        self.config = config;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Whether a provider is attached and reports healthy
    pub async fn ai_available(&self) -> bool {
        match &self.provider {
            Some(provider) => tokio::time::timeout(self.config.step_timeout, provider.is_available())
                .await
                .unwrap_or(false),
            None => false,
        }
    }

    /// Generate a document
    ///
    /// `requested` may name a canonical or legacy strategy; unknown names
    /// are ignored.
    ///
    /// # Errors
    /// Only when the built-in template tier itself is unusable.
    pub async fn generate(
        &self,
        context: &Context,
        resolved: &ResolvedTemplate,
        requested: Option<&str>,
    ) -> GenerationResult<RenderedDocument> {
        let started = Instant::now();
        let emergency_requested = requested
            .and_then(crate::strategy::canonical_strategy)
            .is_some_and(|s| s == StrategyKind::Emergency);
        let ai_available = !emergency_requested && self.ai_available().await;
        let selected = select_strategy(requested, ai_available);

        let key = CacheKey::document(
            &context.fingerprint,
            &resolved.template.key,
            resolved.tier(),
            selected,
        );
        if let Some(cache) = &self.cache {
            if let Some(mut document) = cache.get::<RenderedDocument>(&key).await {
                document.cache_hit = true;
                document.duration_ms = elapsed_ms(started);
                return Ok(document);
            }
        }

        let scope = context.to_scope();
        let mut attempts = Vec::new();

        let primary = match (&self.provider, selected) {
            (Some(provider), StrategyKind::Primary) => {
                self.run_primary(provider.as_ref(), context, resolved, &scope, started, &mut attempts)
                    .await
            }
            _ => None,
        };

        let document = if let Some((step, output)) = primary {
            self.document(
                context,
                StrategyKind::Primary,
                Some(step),
                output,
                resolved.template.resolution_path.clone(),
                started,
                attempts,
            )
        } else {
            if selected == StrategyKind::Primary {
                tracing::warn!(
                    template = %resolved.template.resolution_path,
                    "primary strategy exhausted; activating emergency strategy"
                );
            }
            let (output, path) = self.run_emergency(resolved, &scope, &mut attempts)?;
            self.document(context, StrategyKind::Emergency, None, output, path, started, attempts)
        };

        tracing::info!(
            strategy = %document.strategy_used,
            step = document.primary_step.map(PrimaryStep::as_str),
            confidence = document.confidence,
            low_confidence = document.low_confidence,
            duration_ms = document.duration_ms,
            "document generated"
        );

        if document.strategy_used == selected {
            if let Some(cache) = &self.cache {
                cache.set(&key, &document, self.config.document_ttl).await;
            }
        }
        Ok(document)
    }

    #[allow(clippy::too_many_arguments)]
    fn document(
        &self,
        context: &Context,
        strategy: StrategyKind,
        primary_step: Option<PrimaryStep>,
        output: StepOutput,
        template_path: ResolutionPath,
        started: Instant,
        attempts: Vec<AttemptRecord>,
    ) -> RenderedDocument {
        let confidence = match strategy {
            StrategyKind::Primary => context.overall_confidence,
            StrategyKind::Emergency => context.overall_confidence * self.config.emergency_discount,
        };
        RenderedDocument {
            content: output.content,
            strategy_used: strategy,
            primary_step,
            confidence,
            low_confidence: context.overall_confidence < self.config.min_confidence,
            unresolved_fields: output.unresolved,
            template_path,
            duration_ms: elapsed_ms(started),
            cache_hit: false,
            attempts,
        }
    }

    async fn run_primary(
        &self,
        provider: &dyn AiProvider,
        context: &Context,
        resolved: &ResolvedTemplate,
        scope: &Value,
        started: Instant,
        attempts: &mut Vec<AttemptRecord>,
    ) -> Option<(PrimaryStep, StepOutput)> {
        for step in PrimaryStep::ORDER {
            let remaining = self.config.request_timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                attempts.push(
                    AttemptRecord::new(step.as_str(), AttemptOutcome::Skipped, 0)
                        .with_reason("request budget exhausted"),
                );
                continue;
            }
            let timeout = self.config.step_timeout.min(remaining);
            let step_started = Instant::now();

            let result = match step {
                PrimaryStep::ContextGuided => {
                    self.context_guided(provider, context, resolved, scope, timeout).await
                }
                PrimaryStep::SummaryOnly => {
                    if context.successful_count() == 0 {
                        Err(StepError::Skipped("no successful analyzer sections"))
                    } else {
                        let prompt = prompt::summary_only(context, &resolved.template);
                        self.markdown(provider, &prompt, resolved, timeout).await
                    }
                }
                PrimaryStep::RawDescription => {
                    let prompt = prompt::raw_description(&context.summary, &resolved.template);
                    self.markdown(provider, &prompt, resolved, timeout).await
                }
            };

            let duration_ms = elapsed_ms(step_started);
            match result {
                Ok(output) => {
                    tracing::info!(step = %step, duration_ms, "generation step succeeded");
                    attempts.push(AttemptRecord::new(step.as_str(), AttemptOutcome::Succeeded, duration_ms));
                    return Some((step, output));
                }
                Err(e) => {
                    if matches!(e, StepError::Skipped(_)) {
                        tracing::debug!(step = %step, reason = %e, "generation step skipped");
                    } else {
                        tracing::warn!(step = %step, error = %e, duration_ms, "generation step failed");
                    }
                    attempts.push(
                        AttemptRecord::new(step.as_str(), e.outcome(), duration_ms).with_reason(e.to_string()),
                    );
                }
            }
        }
        None
    }

    async fn context_guided(
        &self,
        provider: &dyn AiProvider,
        context: &Context,
        resolved: &ResolvedTemplate,
        scope: &Value,
        timeout: Duration,
    ) -> Result<StepOutput, StepError> {
        if context.successful_count() == 0 {
            return Err(StepError::Skipped("no successful analyzer sections"));
        }
        let requirements = resolved.program().requirements();
        let prompt = prompt::context_guided(&resolved.template, &requirements, scope);
        let response = call(provider, &prompt, timeout).await?;
        let fields = parse_json_object(&response)?;

        let mut scope = scope.clone();
        merge_ai_fields(&mut scope, fields);

        let output = self.renderer.render_program(resolved.program(), &scope)?;
        let missing = missing_in_render(&resolved.template.required_fields, &output);
        if !missing.is_empty() {
            return Err(StepError::Validation { missing });
        }
        Ok(StepOutput {
            content: output.text,
            unresolved: output.unresolved_fields,
        })
    }

    async fn markdown(
        &self,
        provider: &dyn AiProvider,
        prompt: &str,
        resolved: &ResolvedTemplate,
        timeout: Duration,
    ) -> Result<StepOutput, StepError> {
        let content = call(provider, prompt, timeout).await?;
        if has_placeholders(&content) {
            return Err(StepError::Malformed("response contains template placeholders".into()));
        }
        let missing = missing_in_markdown(&resolved.template.required_fields, &content);
        if !missing.is_empty() {
            return Err(StepError::Validation { missing });
        }
        Ok(StepOutput {
            content,
            unresolved: BTreeSet::new(),
        })
    }

    fn run_emergency(
        &self,
        resolved: &ResolvedTemplate,
        scope: &Value,
        attempts: &mut Vec<AttemptRecord>,
    ) -> GenerationResult<(StepOutput, ResolutionPath)> {
        let started = Instant::now();
        match self.render_complete(resolved, scope) {
            Ok(output) => {
                attempts.push(AttemptRecord::new(EMERGENCY_STEP, AttemptOutcome::Succeeded, elapsed_ms(started)));
                return Ok((output, resolved.template.resolution_path.clone()));
            }
            Err(e) => {
                tracing::warn!(
                    template = %resolved.template.resolution_path,
                    error = %e,
                    "emergency render incomplete; falling back to built-in template"
                );
                attempts.push(
                    AttemptRecord::new(EMERGENCY_STEP, e.outcome(), elapsed_ms(started)).with_reason(e.to_string()),
                );
            }
        }

        let started = Instant::now();
        let builtin = self.resolver.builtin(&resolved.template.key)?;
        let output = self
            .render_complete(&builtin, scope)
            .map_err(|e| GenerationError::Exhausted(e.to_string()))?;
        attempts.push(AttemptRecord::new(EMERGENCY_STEP, AttemptOutcome::Succeeded, elapsed_ms(started)));
        Ok((output, builtin.template.resolution_path))
    }

    /// Render with a pre-filled scope; anything left unresolved is a failure
    ///
    /// Fields inside branches the render opened are filled and the template
    /// re-rendered, at most once per requirement.
    fn render_complete(&self, resolved: &ResolvedTemplate, scope: &Value) -> Result<StepOutput, StepError> {
        let requirements = resolved.program().requirements();
        let policy = self.renderer.policy();
        let mut scope = scope.clone();
        prefill(&mut scope, &requirements, policy);
        let mut output: RenderOutput = self.renderer.render_program(resolved.program(), &scope)?;
        for _ in 0..requirements.len() {
            if output.unresolved_fields.is_empty()
                || !prefill_reached(&mut scope, &requirements, &output.unresolved_fields, policy)
            {
                break;
            }
            output = self.renderer.render_program(resolved.program(), &scope)?;
        }

        let missing = missing_in_render(&resolved.template.required_fields, &output);
        if !missing.is_empty() {
            return Err(StepError::Validation { missing });
        }
        if !output.unresolved_fields.is_empty() {
            return Err(StepError::Unresolved {
                fields: output.unresolved_fields.into_iter().collect(),
            });
        }
        Ok(StepOutput {
            content: output.text,
            unresolved: BTreeSet::new(),
        })
    }
}

async fn call(provider: &dyn AiProvider, prompt: &str, timeout: Duration) -> Result<String, StepError> {
    let response = tokio::time::timeout(timeout, provider.generate(prompt, timeout))
        .await
        .map_err(|_| AiError::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })??;
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(AiError::EmptyResponse.into());
    }
    Ok(trimmed.to_string())
}

/// Extract a JSON object from a bare or fenced response
fn parse_json_object(response: &str) -> Result<Map<String, Value>, StepError> {
    let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) else {
        return Err(StepError::Malformed("expected a JSON object".into()));
    };
    if end < start {
        return Err(StepError::Malformed("expected a JSON object".into()));
    }
    serde_json::from_str(&response[start..=end])
        .map_err(|e| StepError::Malformed(format!("expected a JSON object: {e}")))
}

/// Merge AI values where the scope has none; the raw object is kept under `ai`
fn merge_ai_fields(scope: &mut Value, fields: Map<String, Value>) {
    let Some(root) = scope.as_object_mut() else {
        return;
    };
    root.entry("ai")
        .or_insert_with(|| Value::Object(fields.clone()));
    for (key, value) in fields {
        let key = key.trim_end_matches("[]");
        if key.is_empty() || key.contains("[]") {
            continue;
        }
        let keys: Vec<&str> = key.split('.').collect();
        merge_at(root, &keys, value);
    }
}

fn merge_at(map: &mut Map<String, Value>, keys: &[&str], value: Value) {
    let Some((first, rest)) = keys.split_first() else {
        return;
    };
    let slot = map.entry((*first).to_string()).or_insert(Value::Null);
    if rest.is_empty() {
        merge_missing(slot, value);
        return;
    }
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(child) = slot {
        merge_at(child, rest, value);
    }
}

fn merge_missing(slot: &mut Value, value: Value) {
    match (slot, value) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (k, v) in incoming {
                merge_missing(existing.entry(k).or_insert(Value::Null), v);
            }
        }
        (slot, value) if is_blank(slot) => *slot = value,
        _ => {}
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAiProvider;
    use chrono::Utc;
    use dgen_model::{
        AnalysisData, AnalyzerResult, ComplexityBand, ComputedMetrics, DesignSummary,
        EffortEstimate, Fingerprint, Priority,
    };
    use dgen_template::MemoryTemplateSource;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn context(successes: usize) -> Context {
        let mut context = context_at(successes);
        context.overall_confidence = if successes > 0 { 0.8 } else { 0.0 };
        context
    }

    fn context_at(successes: usize) -> Context {
        let sections = (0..successes)
            .map(|i| {
                let id = format!("a{i}");
                let result = AnalyzerResult::success(id.as_str(), 0.8, AnalysisData::Custom(json!({"i": i})));
                (result.analyzer_id.clone(), result)
            })
            .collect();
        Context {
            fingerprint: Fingerprint::compute(b"orchestrator"),
            summary: DesignSummary {
                title: "Login".into(),
                ..DesignSummary::default()
            },
            sections,
            overall_confidence: 0.0,
            computed_metrics: ComputedMetrics {
                complexity: 2.0,
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

    fn resolver() -> TemplateResolver {
        TemplateResolver::from_source(Arc::new(MemoryTemplateSource::new()))
    }

    async fn ticket() -> ResolvedTemplate {
        resolver().resolve("jira", "ticket", "react").await.unwrap()
    }

    fn provider(responses: Vec<Result<String, AiError>>) -> MockAiProvider {
        let mut provider = MockAiProvider::new();
        provider.expect_is_available().returning(|| true);
        let mut responses = responses.into_iter();
        provider
            .expect_generate()
            .returning(move |_, _| responses.next().unwrap_or(Err(AiError::provider("exhausted"))));
        provider
    }

    #[tokio::test]
    async fn context_guided_merges_json_fields() {
        let ai = provider(vec![Ok(
            "```json\n{\"description\": \"Sign in\", \"acceptance_criteria\": [\"Rejects bad password\"]}\n```"
                .into(),
        )]);
        let orchestrator = GenerationOrchestrator::new(resolver()).with_provider(Arc::new(ai));

        let doc = orchestrator.generate(&context(2), &ticket().await, None).await.unwrap();

        assert_eq!(doc.strategy_used, StrategyKind::Primary);
        assert_eq!(doc.primary_step, Some(PrimaryStep::ContextGuided));
        assert!(doc.content.contains("Rejects bad password"));
        assert!(doc.content.contains("Sign in"));
        assert_eq!(doc.confidence, 0.8);
    }

    #[tokio::test]
    async fn falls_through_to_summary_step() {
        let ai = provider(vec![
            Err(AiError::provider("503")),
            Ok("## Title\nLogin\n## Description\nx\n## Acceptance Criteria\n- a\n**Priority:** low".into()),
        ]);
        let orchestrator = GenerationOrchestrator::new(resolver()).with_provider(Arc::new(ai));

        let doc = orchestrator.generate(&context(1), &ticket().await, None).await.unwrap();

        assert_eq!(doc.primary_step, Some(PrimaryStep::SummaryOnly));
        assert_eq!(doc.attempts[0].outcome, AttemptOutcome::ProviderFailed);
        assert_eq!(doc.attempts[1].outcome, AttemptOutcome::Succeeded);
    }

    #[tokio::test]
    async fn invalid_markdown_exhausts_to_emergency() {
        let ai = provider(vec![Ok("just prose".into()), Ok("   ".into())]);
        let orchestrator = GenerationOrchestrator::new(resolver()).with_provider(Arc::new(ai));

        let doc = orchestrator.generate(&context(0), &ticket().await, None).await.unwrap();

        assert!(doc.is_emergency());
        assert!(doc.unresolved_fields.is_empty());
        assert_eq!(doc.confidence, 0.0);
        assert!(doc.low_confidence);
        let outcomes: Vec<_> = doc.attempts.iter().map(|a| a.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                AttemptOutcome::Skipped,
                AttemptOutcome::Skipped,
                AttemptOutcome::ValidationFailed,
                AttemptOutcome::Succeeded,
            ]
        );
    }

    #[derive(Debug)]
    struct Stalled;

    #[async_trait::async_trait]
    impl AiProvider for Stalled {
        async fn is_available(&self) -> bool {
            true
        }

        async fn generate(&self, _prompt: &str, _max_timeout: Duration) -> Result<String, AiError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("late".into())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_provider_times_out_per_step() {
        let orchestrator = GenerationOrchestrator::new(resolver())
            .with_provider(Arc::new(Stalled))
            .with_config(GenerationConfig {
                step_timeout: Duration::from_millis(100),
                ..GenerationConfig::default()
            });

        let doc = orchestrator.generate(&context(1), &ticket().await, None).await.unwrap();

        assert!(doc.is_emergency());
        let outcomes: Vec<_> = doc.attempts.iter().map(|a| a.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                AttemptOutcome::TimedOut,
                AttemptOutcome::TimedOut,
                AttemptOutcome::TimedOut,
                AttemptOutcome::Succeeded,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn request_budget_caps_primary_strategy() {
        let orchestrator = GenerationOrchestrator::new(resolver())
            .with_provider(Arc::new(Stalled))
            .with_config(GenerationConfig {
                step_timeout: Duration::from_secs(20),
                request_timeout: Duration::from_secs(30),
                ..GenerationConfig::default()
            });

        let doc = orchestrator.generate(&context(1), &ticket().await, None).await.unwrap();

        assert!(doc.is_emergency());
        assert_eq!(doc.attempts[0].outcome, AttemptOutcome::TimedOut);
        assert_eq!(doc.attempts[1].outcome, AttemptOutcome::TimedOut);
        assert_eq!(doc.attempts[2].outcome, AttemptOutcome::Skipped);
        assert_eq!(doc.attempts[2].reason.as_deref(), Some("request budget exhausted"));
    }

    #[tokio::test]
    async fn emergency_request_skips_provider() {
        let mut ai = MockAiProvider::new();
        ai.expect_is_available().never();
        ai.expect_generate().never();
        let orchestrator = GenerationOrchestrator::new(resolver()).with_provider(Arc::new(ai));

        let doc = orchestrator
            .generate(&context(2), &ticket().await, Some("offline"))
            .await
            .unwrap();
        assert!(doc.is_emergency());
        assert!((doc.confidence - 0.4).abs() < 1e-9);
        assert!(!doc.low_confidence);
    }

    #[tokio::test]
    async fn low_confidence_follows_context_not_discounted_score() {
        let orchestrator = GenerationOrchestrator::new(resolver());
        let template = ticket().await;

        let mut moderate = context_at(1);
        moderate.overall_confidence = 0.6;
        let doc = orchestrator.generate(&moderate, &template, None).await.unwrap();
        assert!(doc.is_emergency());
        assert!((doc.confidence - 0.3).abs() < 1e-9);
        assert!(!doc.low_confidence);

        let mut weak = context_at(1);
        weak.overall_confidence = 0.35;
        let doc = orchestrator.generate(&weak, &template, None).await.unwrap();
        assert!(doc.low_confidence);
    }

    #[tokio::test]
    async fn cached_documents_are_flagged() {
        let orchestrator = GenerationOrchestrator::new(resolver()).with_cache(ResultCache::in_memory(16));
        let template = ticket().await;
        let first = orchestrator.generate(&context(1), &template, None).await.unwrap();
        let second = orchestrator.generate(&context(1), &template, None).await.unwrap();
        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(first.content, second.content);
    }

    #[test]
    fn json_extraction() {
        assert!(parse_json_object("no json here").is_err());
        assert!(parse_json_object("} {").is_err());
        let map = parse_json_object("Sure! {\"a\": 1} Hope that helps").unwrap();
        assert_eq!(map["a"], json!(1));
    }

    #[test]
    fn ai_values_never_override_context() {
        let mut scope = json!({"title": "Login", "metrics": {"priority": "low"}});
        let fields = json!({
            "title": "Other",
            "metrics.priority": "high",
            "metrics.effort": "1 day",
            "description": "From AI",
            "steps[].name": "ignored"
        });
        let Value::Object(fields) = fields else { unreachable!() };
        merge_ai_fields(&mut scope, fields);
        assert_eq!(scope["title"], "Login");
        assert_eq!(scope["metrics"]["priority"], "low");
        assert_eq!(scope["metrics"]["effort"], "1 day");
        assert_eq!(scope["description"], "From AI");
        assert_eq!(scope["ai"]["title"], "Other");
        assert!(scope.get("steps").is_none());
    }
}
