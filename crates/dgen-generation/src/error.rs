//! Error types for document generation
//!
//! [`AiError`] and [`StepError`] are recoverable: they end one attempt and
//! are recorded in the document's attempt trail. [`GenerationError`] is the
//! only error surfaced to callers.

use dgen_model::AttemptOutcome;
use dgen_template::{RenderError, TemplateError};

/// AI provider failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiError {
    #[error("AI provider is unavailable")]
    Unavailable,

    #[error("AI call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("AI provider error: {0}")]
    Provider(String),

    #[error("AI provider returned an empty response")]
    EmptyResponse,
}

impl AiError {
    /// Create provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }
}

/// Why one generation attempt did not produce a document
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("required fields missing from output: {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("fields left unresolved after completion: {}", .fields.join(", "))]
    Unresolved { fields: Vec<String> },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("{0}")]
    Skipped(&'static str),
}

impl StepError {
    /// Attempt-trail classification
    #[must_use]
    pub fn outcome(&self) -> AttemptOutcome {
        match self {
            Self::Ai(AiError::Timeout { .. }) => AttemptOutcome::TimedOut,
            Self::Ai(AiError::EmptyResponse) => AttemptOutcome::EmptyResponse,
            Self::Ai(AiError::Unavailable | AiError::Provider(_)) => AttemptOutcome::ProviderFailed,
            Self::Validation { .. } | Self::Unresolved { .. } | Self::Malformed(_) => {
                AttemptOutcome::ValidationFailed
            }
            Self::Render(_) => AttemptOutcome::RenderFailed,
            Self::Skipped(_) => AttemptOutcome::Skipped,
        }
    }
}

/// Unrecoverable generation failure
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The built-in template tier could not be used
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Even the built-in template could not be rendered completely
    #[error("generation exhausted every strategy: {0}")]
    Exhausted(String),
}

/// Result type alias for generation operations
pub type GenerationResult<T> = Result<T, GenerationError>;
