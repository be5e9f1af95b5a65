//! Pipeline configuration
//!
//! Every section and field has a default, so an empty TOML document is a
//! valid configuration.

use crate::error::{PipelineError, PipelineResult};
use dgen_context::{AggregatorConfig, ConfidenceWeights};
use dgen_generation::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Analyzer fan-out
    pub aggregation: AggregationSettings,
    /// Strategy timeouts and confidence rules
    pub generation: GenerationSettings,
    /// Context and document caching
    pub cache: CacheSettings,
    /// Template lookup
    pub templates: TemplateSettings,
}

/// `[aggregation]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationSettings {
    /// Per-analyzer budget
    pub analyzer_timeout_ms: u64,
    /// Analyzers running at once
    pub max_concurrency: usize,
    pub context_ttl_secs: u64,
    /// `analyzer id → weight`; unlisted analyzers weigh 1.0
    pub weights: ConfidenceWeights,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            analyzer_timeout_ms: 3_000,
            max_concurrency: 8,
            context_ttl_secs: 900,
            weights: ConfidenceWeights::default(),
        }
    }
}

/// `[generation]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Budget of one AI strategy step
    pub step_timeout_ms: u64,
    /// Budget of the whole generation before going straight to emergency
    pub request_timeout_ms: u64,
    /// Multiplier applied to the context confidence of emergency documents
    pub emergency_discount: f64,
    /// Contexts below this produce `low_confidence` documents
    pub min_confidence: f64,
    pub document_ttl_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            step_timeout_ms: 20_000,
            request_timeout_ms: 60_000,
            emergency_discount: 0.5,
            min_confidence: 0.4,
            document_ttl_secs: 600,
        }
    }
}

/// `[cache]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Disable to recompute every request
    pub enabled: bool,
    /// Cache backend calls slower than this count as misses
    pub io_timeout_ms: u64,
    /// Capacity of the in-memory cache backend
    pub max_entries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            io_timeout_ms: 250,
            max_entries: 10_000,
        }
    }
}

/// `[templates]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Root of the template namespace
    pub root: PathBuf,
    /// Larger template files are rejected
    pub max_file_size: u64,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("templates"),
            max_file_size: dgen_template::source::DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With template root
    #[inline]
    #[must_use]
    pub fn with_template_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.templates.root = root.into();
        self
    }

    /// With cache enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache.enabled = enabled;
        self
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// `ConfigParse` for malformed TOML, `Config` for out-of-range values.
    pub fn from_toml_str(source: &str) -> PipelineResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// `Io` if the file cannot be read, otherwise as [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// `ConfigSerialize` if a value has no TOML form.
    pub fn to_toml_string(&self) -> PipelineResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `Config` naming the first offending key.
    pub fn validate(&self) -> PipelineResult<()> {
        let a = &self.aggregation;
        let g = &self.generation;
        if a.max_concurrency == 0 {
            return Err(PipelineError::config("aggregation.max_concurrency must be at least 1"));
        }
        if a.analyzer_timeout_ms == 0 {
            return Err(PipelineError::config("aggregation.analyzer_timeout_ms must be positive"));
        }
        if g.step_timeout_ms == 0 || g.request_timeout_ms == 0 {
            return Err(PipelineError::config("generation timeouts must be positive"));
        }
        if !(0.0..=1.0).contains(&g.emergency_discount) {
            return Err(PipelineError::config("generation.emergency_discount must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&g.min_confidence) {
            return Err(PipelineError::config("generation.min_confidence must be within [0, 1]"));
        }
        a.weights.validate()?;
        Ok(())
    }

    /// Aggregator settings
    #[must_use]
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            analyzer_timeout: Duration::from_millis(self.aggregation.analyzer_timeout_ms),
            max_concurrency: self.aggregation.max_concurrency,
            context_ttl: Duration::from_secs(self.aggregation.context_ttl_secs),
            weights: self.aggregation.weights.clone(),
        }
    }

    /// Generation settings
    #[must_use]
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            step_timeout: Duration::from_millis(self.generation.step_timeout_ms),
            request_timeout: Duration::from_millis(self.generation.request_timeout_ms),
            emergency_discount: self.generation.emergency_discount,
            min_confidence: self.generation.min_confidence,
            document_ttl: Duration::from_secs(self.generation.document_ttl_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
[aggregation]
analyzer_timeout_ms = 3000
max_concurrency = 8
context_ttl_secs = 900
[aggregation.weights]
structure = 2.0
[generation]
step_timeout_ms = 20000
request_timeout_ms = 60000
emergency_discount = 0.5
min_confidence = 0.4
document_ttl_secs = 600
[cache]
io_timeout_ms = 250
max_entries = 10000
[templates]
root = "templates"
"#;

    #[test]
    fn parses_full_document() {
        let config = PipelineConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.aggregation.weights.weight(&"structure".into()), 2.0);
        assert_eq!(config.aggregation.weights.weight(&"styles".into()), 1.0);
        assert_eq!(config.templates.root, PathBuf::from("templates"));
        assert!(config.cache.enabled);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(PipelineConfig::from_toml_str("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = PipelineConfig::from_toml_str("[generation]\nmin_confidence = 0.7\n").unwrap();
        assert_eq!(config.generation.min_confidence, 0.7);
        assert_eq!(config.generation.step_timeout_ms, 20_000);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = PipelineConfig::from_toml_str("[generation]\nemergency_discount = 1.5\n").unwrap_err();
        assert!(matches!(err, PipelineError::Config(msg) if msg.contains("emergency_discount")));
        let err = PipelineConfig::from_toml_str("[aggregation]\nmax_concurrency = 0\n").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(matches!(
            PipelineConfig::from_toml_str("[cache\n").unwrap_err(),
            PipelineError::ConfigParse(_)
        ));
    }

    #[test]
    fn converts_to_component_configs() {
        let config = PipelineConfig::default();
        assert_eq!(config.aggregator_config().analyzer_timeout, Duration::from_secs(3));
        assert_eq!(config.generation_config().request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn toml_round_trip() {
        let config = PipelineConfig::new().with_template_root("/srv/templates");
        let text = config.to_toml_string().unwrap();
        assert_eq!(PipelineConfig::from_toml_str(&text).unwrap(), config);
    }
}
