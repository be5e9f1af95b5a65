//! Template identity and resolution metadata
//!
//! Templates live in a hierarchical namespace keyed by
//! `(platform, document_type, tech_stack)`. Keys are normalized on
//! construction so arbitrary caller input always maps to a safe, bounded
//! namespace segment.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Segment used when a key component is empty after normalization
pub const GENERIC_SEGMENT: &str = "generic";

/// Maximum length of a normalized key segment
pub const MAX_SEGMENT_LEN: usize = 64;

/// Normalized resolution key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateKey {
    platform: String,
    document_type: String,
    tech_stack: String,
}

impl TemplateKey {
    /// Create a key, normalizing every component
    #[must_use]
    pub fn new(platform: &str, document_type: &str, tech_stack: &str) -> Self {
        Self {
            platform: normalize_segment(platform),
            document_type: normalize_segment(document_type),
            tech_stack: normalize_segment(tech_stack),
        }
    }

    /// Target platform (e.g. `jira`)
    #[inline]
    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Document type (e.g. `ticket`)
    #[inline]
    #[must_use]
    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    /// Technology stack (e.g. `react`)
    #[inline]
    #[must_use]
    pub fn tech_stack(&self) -> &str {
        &self.tech_stack
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.platform, self.document_type, self.tech_stack)
    }
}

/// Normalize one namespace segment
///
/// Lowercases, maps anything outside `[a-z0-9_-]` to `-`, collapses runs of
/// `-`, trims leading/trailing `-`, bounds the length, and falls back to
/// [`GENERIC_SEGMENT`] when nothing is left.
#[must_use]
pub fn normalize_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len().min(MAX_SEGMENT_LEN));
    for c in raw.trim().chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '-'
        };
        if c == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(c);
        if out.len() >= MAX_SEGMENT_LEN {
            break;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        GENERIC_SEGMENT.to_string()
    } else {
        out
    }
}

/// Resolution tier, most specific first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionTier {
    /// `platform/document_type/<tech_stack>`
    TechSpecific,
    /// `platform/document_type/generic`
    PlatformGeneric,
    /// `custom/defaults/<document_type>`
    CustomDefault,
    /// Built-in template compiled into the binary
    BuiltIn,
}

impl ResolutionTier {
    /// All tiers in resolution order
    pub const ORDER: [ResolutionTier; 4] = [
        Self::TechSpecific,
        Self::PlatformGeneric,
        Self::CustomDefault,
        Self::BuiltIn,
    ];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TechSpecific => "tech-specific",
            Self::PlatformGeneric => "platform-generic",
            Self::CustomDefault => "custom-default",
            Self::BuiltIn => "built-in",
        }
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionTier {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ModelError::UnknownTier(s.to_string()))
    }
}

/// Where a template was found
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionPath {
    pub tier: ResolutionTier,
    /// Namespace location (e.g. `custom/defaults/ticket`)
    pub location: String,
}

impl ResolutionPath {
    /// Create a resolution path
    #[inline]
    #[must_use]
    pub fn new(tier: ResolutionTier, location: impl Into<String>) -> Self {
        Self {
            tier,
            location: location.into(),
        }
    }
}

impl fmt::Display for ResolutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.location, self.tier)
    }
}

/// A resolved template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Requested key (not the location it was found at)
    pub key: TemplateKey,
    pub resolution_path: ResolutionPath,
    /// Templating source
    pub body: String,
    /// Fields that must be present in any rendered output
    pub required_fields: BTreeSet<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl Template {
    /// Target platform
    #[inline]
    #[must_use]
    pub fn platform(&self) -> &str {
        self.key.platform()
    }

    /// Document type
    #[inline]
    #[must_use]
    pub fn document_type(&self) -> &str {
        self.key.document_type()
    }

    /// Tech stack
    #[inline]
    #[must_use]
    pub fn tech_stack(&self) -> &str {
        self.key.tech_stack()
    }

    /// Resolution tier
    #[inline]
    #[must_use]
    pub fn tier(&self) -> ResolutionTier {
        self.resolution_path.tier
    }
}
