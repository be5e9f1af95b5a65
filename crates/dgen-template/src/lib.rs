//! dgen Template
//!
//! Template storage, tiered resolution and rendering.
//!
//! # Architecture
//!
//! ```text
//! TemplateSource (fs / memory) → TemplateStore (cache, incl. misses)
//!                                      ↓
//!                 TemplateResolver: tech-specific → platform-generic
//!                                   → custom/defaults → built-in
//!                                      ↓
//!                 TemplateRenderer: Program + scope → RenderOutput
//! ```
//!
//! # Example
//!
//! ```rust
//! use dgen_template::TemplateRenderer;
//! use serde_json::json;
//!
//! let out = TemplateRenderer::new()
//!     .render("# {{ title | upper }} ({{ metrics.priority }})", &json!({"title": "login"}))
//!     .unwrap();
//!
//! assert_eq!(out.text, "# LOGIN (medium)");
//! assert!(out.unresolved_fields.contains("metrics.priority"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod builtin;
pub mod definition;
pub mod error;
pub mod renderer;
pub mod resolver;
pub mod source;
pub mod store;

pub use definition::{FrontMatter, TemplateDefinition};
pub use error::{LoadError, ParseError, RenderError, TemplateError, TemplateResult};
pub use renderer::{
    DefaultPolicy, FieldRequirement, FieldUsage, Path, PathSegment, Program, RenderOutput,
    TemplateRenderer,
};
pub use resolver::{ResolvedTemplate, TemplateResolver};
pub use source::{FsTemplateSource, MemoryTemplateSource, TemplateSource};
pub use store::{CachedEntry, TemplateStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for resolving and rendering templates
    pub use crate::error::{TemplateError, TemplateResult};
    pub use crate::renderer::{RenderOutput, TemplateRenderer};
    pub use crate::resolver::{ResolvedTemplate, TemplateResolver};
    pub use crate::source::{FsTemplateSource, MemoryTemplateSource, TemplateSource};
    pub use dgen_model::{ResolutionTier, Template, TemplateKey};
}
