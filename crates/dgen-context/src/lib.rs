//! dgen Context
//!
//! Concurrent analyzer fan-out and fan-in into one confidence-scored
//! [`Context`](dgen_model::Context), with a TTL result cache keyed by the
//! input fingerprint.
//!
//! # Guarantees
//!
//! - Aggregation never fails: panics, timeouts and malformed results become
//!   zero-confidence sections.
//! - Overall confidence is a weighted mean over successful analyzers only.
//! - At most one computation per fingerprint runs at a time.
//! - Cache failures are misses.
//!
//! # Example
//!
//! ```rust
//! use dgen_context::{AnalyzerRegistry, ContextAggregator};
//! use dgen_model::{DesignNode, NodeType, RawInput};
//!
//! # tokio_test_block_on(async {
//! let aggregator = ContextAggregator::new(AnalyzerRegistry::with_builtins());
//! let input = RawInput::new("file-1")
//!     .with_nodes(vec![DesignNode::new("1:1", "Login", NodeType::Frame)]);
//!
//! let out = aggregator.aggregate(&input).await;
//! assert_eq!(out.context.sections.len(), 2);
//! assert!(out.context.overall_confidence > 0.0);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod aggregator;
pub mod analyzer;
pub mod analyzers;
pub mod cache;
pub mod confidence;
pub mod error;
pub mod metrics;

pub use aggregator::{Aggregation, AggregatorConfig, ContextAggregator};
pub use analyzer::{Analyzer, AnalyzerRegistry};
pub use analyzers::{StructureAnalyzer, StyleAnalyzer};
pub use cache::{CacheBackend, CacheEntry, CacheKey, MemoryCacheBackend, ResultCache};
pub use confidence::ConfidenceWeights;
pub use error::{CacheError, ContextError};
pub use metrics::compute_metrics;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building contexts
    pub use crate::aggregator::{Aggregation, AggregatorConfig, ContextAggregator};
    pub use crate::analyzer::{Analyzer, AnalyzerRegistry};
    pub use crate::cache::{CacheBackend, CacheKey, ResultCache};
    pub use dgen_model::{AnalyzerId, AnalyzerResult, Context, RawInput};
}
