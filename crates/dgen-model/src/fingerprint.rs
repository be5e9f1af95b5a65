//! Content fingerprints
//!
//! Provides [`Fingerprint`], a strongly-typed 32-byte Blake3 digest of the
//! semantically relevant part of a design extraction. It is the cache and
//! in-flight deduplication key for everything downstream.

use crate::error::ModelError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte content fingerprint (Blake3)
///
/// Immutable and cheap to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Create a fingerprint from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create fingerprint from byte slice
    ///
    /// # Errors
    /// Returns error if slice length is not exactly 32 bytes
    #[inline]
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        if bytes.len() != 32 {
            return Err(ModelError::InvalidFingerprintLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Digest arbitrary bytes
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self::new(*blake3::hash(data).as_bytes())
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Fingerprint {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8; 32]> for Fingerprint {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

// Always hex on the wire: contexts are cached as JSON.
impl serde::Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Fingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_from_slice_invalid_length() {
        let result = Fingerprint::from_slice(&[1u8; 31]);
        assert!(matches!(
            result,
            Err(ModelError::InvalidFingerprintLength { expected: 32, actual: 31 })
        ));
    }

    #[test]
    fn fingerprint_compute_deterministic() {
        assert_eq!(Fingerprint::compute(b"frame"), Fingerprint::compute(b"frame"));
        assert_ne!(Fingerprint::compute(b"frame"), Fingerprint::compute(b"group"));
    }

    #[test]
    fn fingerprint_display_and_parse() {
        let fp = Fingerprint::compute(b"design");
        let parsed: Fingerprint = fp.to_string().parse().unwrap();
        assert_eq!(fp, parsed);
    }

    #[test]
    fn fingerprint_short_is_prefix() {
        let fp = Fingerprint::compute(b"design");
        let short = fp.short();
        assert_eq!(short.len(), 16);
        assert!(fp.to_string().starts_with(&short));
    }

    #[test]
    fn fingerprint_serde_is_hex_string() {
        let fp = Fingerprint::compute(b"design");
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{fp}\""));
        let decoded: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(fp, decoded);
    }

    #[test]
    fn fingerprint_rejects_bad_hex() {
        assert!("zz".parse::<Fingerprint>().is_err());
    }
}
