//! Error types for context aggregation and caching
//!
//! Neither error ever fails a request: cache errors degrade to a miss and
//! analyzer failures become zero-confidence sections. They exist so the
//! failure can be logged and tested precisely.

use dgen_model::AnalyzerId;

/// Cache backend errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Backend did not answer within the I/O timeout
    #[error("cache {operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// Backend reported a failure
    #[error("cache backend error: {0}")]
    Backend(String),

    /// Stored value could not be (de)serialized
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    /// Create backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Context assembly errors
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// Two analyzers registered under the same id
    #[error("analyzer '{0}' is already registered")]
    DuplicateAnalyzer(AnalyzerId),

    /// Weight is not a finite number
    #[error("invalid confidence weight {weight} for analyzer '{analyzer}'")]
    InvalidWeight { analyzer: AnalyzerId, weight: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CacheError::Timeout {
            operation: "get",
            timeout_ms: 250,
        };
        assert_eq!(err.to_string(), "cache get timed out after 250ms");
        let err = ContextError::DuplicateAnalyzer("structure".into());
        assert_eq!(err.to_string(), "analyzer 'structure' is already registered");
    }
}
