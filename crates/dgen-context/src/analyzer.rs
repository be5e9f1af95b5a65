//! Analyzer plug-in seam
//!
//! An [`Analyzer`] inspects one [`RawInput`] and returns one
//! [`AnalyzerResult`]. Analyzers are independent: they see only the input,
//! never each other's results.

use crate::error::ContextError;
use async_trait::async_trait;
use dgen_model::{AnalyzerId, AnalyzerResult, RawInput};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Independent analysis unit
///
/// Implementations should honour `timeout` themselves when they can; the
/// aggregator enforces it regardless and treats an overrun as a timeout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Analyzer: Send + Sync + Debug + 'static {
    /// Stable identifier; also the key of this analyzer's section
    fn id(&self) -> AnalyzerId;

    /// Analyze the input
    async fn analyze(&self, input: &RawInput, timeout: Duration) -> AnalyzerResult;
}

/// Ordered set of analyzers, unique by id
#[derive(Debug, Clone, Default)]
pub struct AnalyzerRegistry {
    analyzers: Vec<Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `structure` and `styles` analyzers
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.analyzers.push(Arc::new(crate::analyzers::StructureAnalyzer));
        registry.analyzers.push(Arc::new(crate::analyzers::StyleAnalyzer));
        registry
    }

    /// Register an analyzer
    ///
    /// # Errors
    /// `ContextError::DuplicateAnalyzer` if the id is taken.
    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) -> Result<(), ContextError> {
        let id = analyzer.id();
        if self.contains(&id) {
            return Err(ContextError::DuplicateAnalyzer(id));
        }
        self.analyzers.push(analyzer);
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    ///
    /// # Errors
    /// `ContextError::DuplicateAnalyzer` if the id is taken.
    pub fn with(mut self, analyzer: impl Analyzer) -> Result<Self, ContextError> {
        self.register(Arc::new(analyzer))?;
        Ok(self)
    }

    /// Whether an id is registered
    #[must_use]
    pub fn contains(&self, id: &AnalyzerId) -> bool {
        self.analyzers.iter().any(|a| &a.id() == id)
    }

    /// Registered ids in registration order
    #[must_use]
    pub fn ids(&self) -> Vec<AnalyzerId> {
        self.analyzers.iter().map(|a| a.id()).collect()
    }

    /// Iterate analyzers
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Analyzer>> {
        self.analyzers.iter()
    }

    /// Number of analyzers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    /// Whether no analyzer is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }
}
