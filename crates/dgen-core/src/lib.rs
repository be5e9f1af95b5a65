//! dgen Core
//!
//! Entry point for turning a design selection into a document.
//!
//! # Architecture
//!
//! ```text
//! RawInput ──► ContextAggregator ──► Context
//!                                      │
//! (platform, type, stack) ──► TemplateResolver ──► ResolvedTemplate
//!                                      │
//!                          GenerationOrchestrator ──► RenderedDocument
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use dgen_core::prelude::*;
//!
//! # async fn run(input: RawInput) -> Result<(), PipelineError> {
//! let pipeline = DesignPipeline::new(PipelineConfig::load("dgen.toml")?)?;
//! let request = GenerateRequest::new(input, "jira", "ticket", "react");
//! let document = pipeline.generate(&request).await?;
//! println!("{}", document.content);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{
    AggregationSettings, CacheSettings, GenerationSettings, PipelineConfig, TemplateSettings,
};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{DesignPipeline, GenerateRequest, GenerationReport, PipelineBuilder};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running the pipeline
    pub use crate::config::PipelineConfig;
    pub use crate::error::{PipelineError, PipelineResult};
    pub use crate::pipeline::{DesignPipeline, GenerateRequest, GenerationReport};
    pub use dgen_model::{RawInput, RenderedDocument, StrategyKind};
}
