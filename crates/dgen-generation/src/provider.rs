//! AI provider seam

use crate::error::AiError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// Text-generation collaborator
///
/// Concrete clients live outside this workspace. The orchestrator bounds
/// every call with its own timeout as well as passing `max_timeout` down.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + 'static {
    /// Cheap health probe; `false` routes straight to the emergency strategy
    async fn is_available(&self) -> bool;

    /// Generate text for a prompt
    async fn generate(&self, prompt: &str, max_timeout: Duration) -> Result<String, AiError>;
}

/// Provider that is never available
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledProvider;

#[async_trait]
impl AiProvider for DisabledProvider {
    async fn is_available(&self) -> bool {
        false
    }

    async fn generate(&self, _prompt: &str, _max_timeout: Duration) -> Result<String, AiError> {
        Err(AiError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_provider_refuses() {
        let provider = DisabledProvider;
        assert!(!provider.is_available().await);
        assert_eq!(
            provider.generate("x", Duration::from_secs(1)).await,
            Err(AiError::Unavailable)
        );
    }
}
