//! Concurrent fan-out/fan-in of analyzers into one [`Context`]
//!
//! # Flow
//!
//! 1. Fingerprint the input; a live cache entry is returned as-is.
//! 2. Join (or become) the single in-flight computation for the fingerprint.
//! 3. Run every analyzer in a `JoinSet`, at most `max_concurrency` at once,
//!    each bounded by `analyzer_timeout` and isolated from panics.
//! 4. Fold results into sections, weighted confidence and metrics.
//! 5. Write the context to the cache, then retire the in-flight slot.

use crate::analyzer::{Analyzer, AnalyzerRegistry};
use crate::cache::{CacheKey, ResultCache};
use crate::confidence::ConfidenceWeights;
use crate::metrics::compute_metrics;
use chrono::Utc;
use dashmap::DashMap;
use dgen_model::{AnalyzerId, AnalyzerResult, Context, DesignSummary, Fingerprint, RawInput};
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OnceCell, Semaphore};
use tokio::task::JoinSet;

/// Default per-analyzer time budget
pub const DEFAULT_ANALYZER_TIMEOUT: Duration = Duration::from_secs(3);
/// Default fan-out width
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
/// Default context TTL
pub const DEFAULT_CONTEXT_TTL: Duration = Duration::from_secs(900);

/// Aggregator settings
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Budget each analyzer gets before it is recorded as timed out
    pub analyzer_timeout: Duration,
    /// Analyzers running at once (at least 1)
    pub max_concurrency: usize,
    /// Lifetime of a cached context
    pub context_ttl: Duration,
    /// Per-analyzer weights for the overall confidence
    pub weights: ConfidenceWeights,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            analyzer_timeout: DEFAULT_ANALYZER_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            context_ttl: DEFAULT_CONTEXT_TTL,
            weights: ConfidenceWeights::default(),
        }
    }
}

/// Outcome of one [`ContextAggregator::aggregate`] call
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// The assembled (or cached) context
    pub context: Arc<Context>,
    /// Served from the result cache
    pub cache_hit: bool,
    /// Shared another caller's in-flight computation
    pub coalesced: bool,
    /// Wall time of this call, including waiting on a shared computation
    pub duration: Duration,
}

type InFlight = DashMap<Fingerprint, Arc<OnceCell<Arc<Context>>>>;

/// Builds contexts from raw input; never fails
#[derive(Debug, Clone)]
pub struct ContextAggregator {
    registry: Arc<AnalyzerRegistry>,
    cache: Option<ResultCache>,
    config: Arc<AggregatorConfig>,
    in_flight: Arc<InFlight>,
}

impl ContextAggregator {
    /// Create aggregator over a registry, without a cache
    #[must_use]
    pub fn new(registry: AnalyzerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            cache: None,
            config: Arc::new(AggregatorConfig::default()),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Attach a result cache
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace settings
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Number of fingerprints currently being computed
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Aggregate analyzer results for `input`
    pub async fn aggregate(&self, input: &RawInput) -> Aggregation {
        let started = Instant::now();
        let fingerprint = input.fingerprint();
        let key = CacheKey::context(&fingerprint);

        if let Some(cache) = &self.cache {
            if let Some(context) = cache.get::<Context>(&key).await {
                tracing::debug!(fingerprint = %fingerprint.short(), "context served from cache");
                return Aggregation {
                    context: Arc::new(context),
                    cache_hit: true,
                    coalesced: false,
                    duration: started.elapsed(),
                };
            }
        }

        let cell = self
            .in_flight
            .entry(fingerprint)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();

        let mut leader = false;
        let context = cell
            .get_or_init(|| {
                leader = true;
                self.compute(input, fingerprint, &key)
            })
            .await
            .clone();

        if leader {
            self.in_flight
                .remove_if(&fingerprint, |_, slot| Arc::ptr_eq(slot, &cell));
        } else {
            tracing::debug!(fingerprint = %fingerprint.short(), "joined in-flight aggregation");
        }

        Aggregation {
            context,
            cache_hit: false,
            coalesced: !leader,
            duration: started.elapsed(),
        }
    }

    async fn compute(&self, input: &RawInput, fingerprint: Fingerprint, key: &CacheKey) -> Arc<Context> {
        let started = Instant::now();
        let sections = self.run_analyzers(input).await;

        let context = Context {
            fingerprint,
            summary: DesignSummary::from_input(input),
            overall_confidence: self.config.weights.overall(sections.values()),
            computed_metrics: compute_metrics(sections.values()),
            sections,
            created_at: Utc::now(),
        };

        tracing::info!(
            fingerprint = %fingerprint.short(),
            analyzers = context.sections.len(),
            succeeded = context.successful_count(),
            confidence = context.overall_confidence,
            complexity = context.computed_metrics.complexity,
            duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "context aggregated"
        );

        if let Some(cache) = &self.cache {
            cache.set(key, &context, self.config.context_ttl).await;
        }
        Arc::new(context)
    }

    async fn run_analyzers(&self, input: &RawInput) -> BTreeMap<AnalyzerId, AnalyzerResult> {
        let input = Arc::new(input.clone());
        let permits = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let timeout = self.config.analyzer_timeout;

        let mut tasks = JoinSet::new();
        for analyzer in self.registry.iter() {
            let analyzer = Arc::clone(analyzer);
            let input = Arc::clone(&input);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let id = analyzer.id();
                // The semaphore is never closed; a failed acquire just runs unbounded.
                let _permit = permits.acquire_owned().await.ok();
                let result = run_one(analyzer.as_ref(), &id, &input, timeout).await;
                (id, result)
            });
        }

        let mut sections = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, result)) => {
                    sections.insert(id, result);
                }
                Err(e) => tracing::warn!(error = %e, "analyzer task did not complete"),
            }
        }

        for id in self.registry.ids() {
            sections
                .entry(id.clone())
                .or_insert_with(|| AnalyzerResult::failed(id, "analyzer task did not complete"));
        }
        sections
    }
}

async fn run_one(
    analyzer: &dyn Analyzer,
    id: &AnalyzerId,
    input: &RawInput,
    timeout: Duration,
) -> AnalyzerResult {
    let started = Instant::now();
    let call = AssertUnwindSafe(async { analyzer.analyze(input, timeout).await }).catch_unwind();

    let result = match tokio::time::timeout(timeout, call).await {
        Err(_) => AnalyzerResult::timed_out(id.clone(), timeout),
        Ok(Err(panic)) => {
            AnalyzerResult::failed(id.clone(), format!("analyzer panicked: {}", panic_message(&*panic)))
        }
        Ok(Ok(result)) => match result.check_well_formed(id) {
            Ok(()) => result,
            Err(reason) => AnalyzerResult::failed(id.clone(), format!("malformed result: {reason}")),
        },
    };

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    if result.is_success() {
        tracing::debug!(analyzer = %id, confidence = result.confidence, elapsed_ms, "analyzer succeeded");
    } else {
        tracing::warn!(
            analyzer = %id,
            status = ?result.status,
            error = result.error.as_deref().unwrap_or_default(),
            elapsed_ms,
            "analyzer failed"
        );
    }
    result
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::MockAnalyzer;
    use dgen_model::{AnalysisData, AnalyzerStatus, DesignNode, NodeType};

    fn input() -> RawInput {
        RawInput::new("file").with_nodes(vec![DesignNode::new("1:1", "Login", NodeType::Frame)])
    }

    fn mock(id: &'static str, result: impl Fn() -> AnalyzerResult + Send + 'static) -> MockAnalyzer {
        let mut analyzer = MockAnalyzer::new();
        analyzer.expect_id().returning(move || AnalyzerId::from(id));
        analyzer.expect_analyze().returning(move |_, _| result());
        analyzer
    }

    #[tokio::test]
    async fn mismatched_id_is_malformed() {
        let registry = AnalyzerRegistry::new()
            .with(mock("a", || {
                AnalyzerResult::success("b", 0.9, AnalysisData::Custom(serde_json::json!({})))
            }))
            .unwrap();
        let out = ContextAggregator::new(registry).aggregate(&input()).await;
        let section = out.context.section(&"a".into()).unwrap();
        assert_eq!(section.status, AnalyzerStatus::Failed);
        assert!(section.error.as_deref().unwrap().starts_with("malformed result"));
        assert_eq!(out.context.overall_confidence, 0.0);
    }

    #[tokio::test]
    async fn success_without_data_is_malformed() {
        let registry = AnalyzerRegistry::new()
            .with(mock("a", || AnalyzerResult::success("a", 0.9, AnalysisData::Empty)))
            .unwrap();
        let out = ContextAggregator::new(registry).aggregate(&input()).await;
        assert_eq!(out.context.section(&"a".into()).unwrap().status, AnalyzerStatus::Failed);
    }

    #[tokio::test]
    async fn in_flight_slot_is_retired() {
        let aggregator = ContextAggregator::new(AnalyzerRegistry::with_builtins());
        let out = aggregator.aggregate(&input()).await;
        assert!(!out.coalesced);
        assert!(!out.cache_hit);
        assert_eq!(aggregator.in_flight(), 0);
    }

    #[test]
    fn panic_messages() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*boxed), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*boxed), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*boxed), "unknown panic");
    }
}
