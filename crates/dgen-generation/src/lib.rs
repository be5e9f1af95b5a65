//! dgen Generation
//!
//! Turns a [`Context`](dgen_model::Context) and a resolved template into a
//! [`RenderedDocument`](dgen_model::RenderedDocument).
//!
//! # Strategies
//!
//! - **Primary**: three AI-assisted sub-steps, each seeing less context
//!   than the last, each validated against the template's required fields.
//! - **Emergency**: deterministic render over a pre-filled scope; no
//!   external calls, no unresolved fields.
//!
//! Legacy strategy names are accepted and mapped onto these two
//! (see [`canonical_strategy`]).

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod emergency;
pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod strategy;
pub mod validate;

pub use error::{AiError, GenerationError, GenerationResult, StepError};
pub use orchestrator::{GenerationConfig, GenerationOrchestrator, EMERGENCY_STEP};
pub use provider::{AiProvider, DisabledProvider};
pub use strategy::{canonical_strategy, select_strategy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for generating documents
    pub use crate::error::{AiError, GenerationError, GenerationResult};
    pub use crate::orchestrator::{GenerationConfig, GenerationOrchestrator};
    pub use crate::provider::AiProvider;
    pub use dgen_model::{RenderedDocument, StrategyKind};
}
