//! Pipeline errors

use dgen_context::ContextError;
use dgen_generation::GenerationError;
use std::path::PathBuf;

/// Errors surfaced by the pipeline facade
///
/// Request-time failures are almost all absorbed by fallbacks; what remains
/// is configuration trouble and total generation exhaustion.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl PipelineError {
    /// Create configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
