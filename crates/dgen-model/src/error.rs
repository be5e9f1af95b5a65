//! Error types for the data model

/// Errors raised while building or decoding model values
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Invalid fingerprint length
    #[error("invalid fingerprint length: expected {expected}, got {actual}")]
    InvalidFingerprintLength { expected: usize, actual: usize },

    /// Hex encoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unknown strategy name
    #[error("unknown strategy: '{0}'")]
    UnknownStrategy(String),

    /// Unknown resolution tier name
    #[error("unknown resolution tier: '{0}'")]
    UnknownTier(String),
}
