//! dgen Model
//!
//! Data model shared by every stage of the design-to-document pipeline.
//!
//! # Core Concepts
//!
//! - [`RawInput`]: the design-tool extraction for one request
//! - [`Fingerprint`]: Blake3 digest of the input's semantic fields (cache key)
//! - [`AnalyzerResult`]: one analyzer's typed partial result or failure marker
//! - [`Context`]: fan-in of all analyzer results with confidence and metrics
//! - [`Template`] / [`TemplateKey`]: resolved template and its namespace key
//! - [`RenderedDocument`]: terminal output with strategy and attempt trail
//!
//! # Example
//!
//! ```rust
//! use dgen_model::{DesignNode, NodeType, RawInput};
//!
//! let input = RawInput::new("file-1")
//!     .with_nodes(vec![DesignNode::new("1:1", "Login", NodeType::Frame)]);
//!
//! assert_eq!(input.fingerprint(), input.clone().fingerprint());
//! assert_eq!(input.node_count(), 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod analysis;
mod context;
mod document;
mod error;
mod fingerprint;
mod input;
mod template;

pub use analysis::{
    AccessibilityAnalysis, AnalysisData, AnalyzerId, AnalyzerResult, AnalyzerStatus, ColorToken,
    DomainAnalysis, StructureAnalysis, StyleAnalysis,
};
pub use context::{
    ComplexityBand, ComputedMetrics, Context, DesignSummary, EffortEstimate, Priority,
};
pub use document::{AttemptOutcome, AttemptRecord, PrimaryStep, RenderedDocument, StrategyKind};
pub use error::ModelError;
pub use fingerprint::Fingerprint;
pub use input::{
    DesignNode, Geometry, Interaction, NodeType, NodeWalk, RawInput, ScreenshotRef, Selection,
    StyleDefinition, StyleKind,
};
pub use template::{
    normalize_segment, ResolutionPath, ResolutionTier, Template, TemplateKey, GENERIC_SEGMENT,
    MAX_SEGMENT_LEN,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
