//! Built-in deterministic analyzers
//!
//! Both analyzers read only the [`RawInput`](dgen_model::RawInput) and never
//! suspend, so they cannot time out in practice. Any richer analysis
//! (accessibility, domain inference, vision) is a plug-in.

mod structure;
mod styles;

pub use structure::{StructureAnalyzer, STRUCTURE_ANALYZER_ID};
pub use styles::{StyleAnalyzer, STYLE_ANALYZER_ID};
