//! Design-to-document pipeline
//!
//! [`DesignPipeline`] wires the three stages together for one request:
//! aggregate the raw input into a [`Context`], resolve the template for the
//! requested platform/type/stack, then generate the document. Aggregation
//! and resolution never fail; generation fails only if the built-in tier is
//! unusable.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use dgen_context::{Aggregation, AnalyzerRegistry, CacheBackend, ContextAggregator, ResultCache};
use dgen_generation::{AiProvider, GenerationOrchestrator};
use dgen_model::{Context, RawInput, RenderedDocument};
use dgen_template::{FsTemplateSource, ResolvedTemplate, TemplateResolver, TemplateSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

/// One generation request
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Design extraction
    pub input: RawInput,
    /// Target platform, e.g. `jira`
    pub platform: String,
    pub document_type: String,
    /// May be empty
    pub tech_stack: String,
    /// Canonical or legacy strategy name; `None` lets the pipeline choose
    pub strategy: Option<String>,
}

impl GenerateRequest {
    /// Create request
    #[must_use]
    pub fn new(
        input: RawInput,
        platform: impl Into<String>,
        document_type: impl Into<String>,
        tech_stack: impl Into<String>,
    ) -> Self {
        Self {
            input,
            platform: platform.into(),
            document_type: document_type.into(),
            tech_stack: tech_stack.into(),
            strategy: None,
        }
    }

    /// With requested strategy
    #[inline]
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }
}

/// Document plus the context it was generated from
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub document: RenderedDocument,
    /// Context the document was generated from
    pub context: Arc<Context>,
    /// Context came from the result cache
    pub context_cache_hit: bool,
    /// Context was shared with a concurrent identical request
    pub coalesced: bool,
}

/// Pipeline facade
#[derive(Debug, Clone)]
pub struct DesignPipeline {
    config: Arc<PipelineConfig>,
    aggregator: ContextAggregator,
    resolver: TemplateResolver,
    orchestrator: GenerationOrchestrator,
}

impl DesignPipeline {
    /// Pipeline with built-in analyzers, filesystem templates and no AI
    ///
    /// # Errors
    /// `Config` if the configuration is out of range.
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        Self::builder(config).build()
    }

    /// Start a builder
    #[inline]
    #[must_use]
    pub fn builder(config: PipelineConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Context aggregator
    #[inline]
    #[must_use]
    pub fn aggregator(&self) -> &ContextAggregator {
        &self.aggregator
    }

    /// Template resolver
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    /// Whether the AI provider is usable right now
    pub async fn ai_available(&self) -> bool {
        self.orchestrator.ai_available().await
    }

    /// Aggregate input into a context
    pub async fn aggregate(&self, input: &RawInput) -> Aggregation {
        self.aggregator.aggregate(input).await
    }

    /// Resolve the template for a request triple
    ///
    /// # Errors
    /// Only when the built-in tier itself is unusable.
    pub async fn resolve(
        &self,
        platform: &str,
        document_type: &str,
        tech_stack: &str,
    ) -> PipelineResult<ResolvedTemplate> {
        self.resolver
            .resolve(platform, document_type, tech_stack)
            .await
            .map_err(|e| PipelineError::Generation(e.into()))
    }

    /// Generate a document
    ///
    /// # Errors
    /// Only when every strategy, including the built-in emergency render,
    /// failed.
    pub async fn generate(&self, request: &GenerateRequest) -> PipelineResult<RenderedDocument> {
        Ok(self.generate_report(request).await?.document)
    }

    /// Generate a document and keep the context it came from
    ///
    /// # Errors
    /// As [`generate`](Self::generate).
    pub async fn generate_report(&self, request: &GenerateRequest) -> PipelineResult<GenerationReport> {
        let fingerprint = request.input.fingerprint();
        let span = tracing::info_span!(
            "generate",
            fingerprint = %fingerprint.short(),
            platform = %request.platform,
            document_type = %request.document_type,
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &GenerateRequest) -> PipelineResult<GenerationReport> {
        let started = Instant::now();

        let aggregation = self.aggregator.aggregate(&request.input).await;
        let resolved = self
            .resolve(&request.platform, &request.document_type, &request.tech_stack)
            .await?;
        tracing::debug!(
            tier = %resolved.tier(),
            location = %resolved.template.resolution_path.location,
            "template resolved"
        );

        let mut document = self
            .orchestrator
            .generate(&aggregation.context, &resolved, request.strategy.as_deref())
            .await?;
        document.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            strategy = %document.strategy_used,
            confidence = document.confidence,
            unresolved = document.unresolved_fields.len(),
            cache_hit = document.cache_hit,
            duration_ms = document.duration_ms,
            "document generated"
        );

        Ok(GenerationReport {
            document,
            context: aggregation.context,
            context_cache_hit: aggregation.cache_hit,
            coalesced: aggregation.coalesced,
        })
    }
}

/// Builder for [`DesignPipeline`]
#[derive(Debug)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    registry: Option<AnalyzerRegistry>,
    provider: Option<Arc<dyn AiProvider>>,
    templates: Option<Arc<dyn TemplateSource>>,
    cache_backend: Option<Arc<dyn CacheBackend>>,
}

impl PipelineBuilder {
    /// Create builder
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            registry: None,
            provider: None,
            templates: None,
            cache_backend: None,
        }
    }

    /// With analyzers (default: built-in `structure` and `styles`)
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: AnalyzerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// With AI provider (default: none, every request is emergency)
    #[inline]
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn AiProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// With template source (default: filesystem at `templates.root`)
    #[inline]
    #[must_use]
    pub fn with_template_source(mut self, source: Arc<dyn TemplateSource>) -> Self {
        self.templates = Some(source);
        self
    }

    /// With cache backend (default: in-memory when caching is enabled)
    #[inline]
    #[must_use]
    pub fn with_cache_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.cache_backend = Some(backend);
        self
    }

    /// Build the pipeline
    ///
    /// # Errors
    /// `Config` if the configuration is out of range.
    pub fn build(self) -> PipelineResult<DesignPipeline> {
        self.config.validate()?;
        let config = self.config;

        let cache = if config.cache.enabled {
            let backend = self.cache_backend.unwrap_or_else(|| {
                Arc::new(dgen_context::MemoryCacheBackend::new(config.cache.max_entries))
            });
            Some(ResultCache::new(backend).with_io_timeout(Duration::from_millis(config.cache.io_timeout_ms)))
        } else {
            None
        };

        let source = self.templates.unwrap_or_else(|| {
            Arc::new(
                FsTemplateSource::new(&config.templates.root)
                    .with_max_file_size(config.templates.max_file_size),
            )
        });
        let resolver = TemplateResolver::from_source(source);

        let mut aggregator = ContextAggregator::new(self.registry.unwrap_or_else(AnalyzerRegistry::with_builtins))
            .with_config(config.aggregator_config());
        let mut orchestrator =
            GenerationOrchestrator::new(resolver.clone()).with_config(config.generation_config());
        if let Some(cache) = cache {
            aggregator = aggregator.with_cache(cache.clone());
            orchestrator = orchestrator.with_cache(cache);
        }
        if let Some(provider) = self.provider {
            orchestrator = orchestrator.with_provider(provider);
        }

        tracing::info!(
            analyzers = aggregator.registry().len(),
            cache = config.cache.enabled,
            "pipeline ready"
        );

        Ok(DesignPipeline {
            config: Arc::new(config),
            aggregator,
            resolver,
            orchestrator,
        })
    }
}
