//! Template definitions: optional YAML front matter plus a body
//!
//! ```text
//! ---
//! required_fields: [title, description]
//! description: Jira ticket for React components
//! version: "2"
//! ---
//! # {{ title }}
//! ```

use crate::error::LoadError;
use crate::renderer::{Program, TemplateRenderer};
use serde::Deserialize;
use std::collections::BTreeSet;

const FENCE: &str = "---";

/// Metadata declared in front matter
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub required_fields: BTreeSet<String>,
    pub description: Option<String>,
    pub version: Option<String>,
}

/// A parsed, validated template definition
#[derive(Debug, Clone)]
pub struct TemplateDefinition {
    pub location: String,
    pub front_matter: FrontMatter,
    pub body: String,
    pub program: Program,
}

impl TemplateDefinition {
    /// Parse raw template text
    ///
    /// # Errors
    /// - `LoadError::FrontMatter` if the front matter is not valid YAML
    /// - `LoadError::Body` if the body does not parse
    pub fn parse(location: &str, raw: &str) -> Result<Self, LoadError> {
        let (front_matter, body) = split_front_matter(raw);
        let front_matter = match front_matter {
            Some(yaml) if !yaml.trim().is_empty() => serde_yaml::from_str::<FrontMatter>(yaml)
                .map_err(|e| LoadError::FrontMatter {
                    location: location.to_string(),
                    message: e.to_string(),
                })?,
            _ => FrontMatter::default(),
        };
        let program = TemplateRenderer::compile(body).map_err(|source| LoadError::Body {
            location: location.to_string(),
            source,
        })?;
        Ok(Self {
            location: location.to_string(),
            front_matter,
            body: body.to_string(),
            program,
        })
    }
}

/// Split `---\n<yaml>\n---\n<body>`; text without a leading fence is all body
fn split_front_matter(raw: &str) -> (Option<&str>, &str) {
    let Some(rest) = raw
        .strip_prefix(FENCE)
        .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
    else {
        return (None, raw);
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_front_matter_and_body() {
        let raw = "---\nrequired_fields: [title, priority]\nversion: \"2\"\n---\n# {{ title }}\n";
        let def = TemplateDefinition::parse("jira/ticket/react", raw).unwrap();
        assert_eq!(
            def.front_matter.required_fields,
            ["priority", "title"].map(String::from).into()
        );
        assert_eq!(def.front_matter.version.as_deref(), Some("2"));
        assert_eq!(def.body, "# {{ title }}\n");
    }

    #[test]
    fn no_front_matter_is_all_body() {
        let def = TemplateDefinition::parse("x", "plain {{ a }}").unwrap();
        assert_eq!(def.front_matter, FrontMatter::default());
        assert_eq!(def.body, "plain {{ a }}");
    }

    #[test]
    fn unterminated_fence_is_body() {
        let (yaml, body) = split_front_matter("---\nnot closed");
        assert!(yaml.is_none());
        assert_eq!(body, "---\nnot closed");
    }

    #[test]
    fn invalid_yaml_and_body_are_errors() {
        let err = TemplateDefinition::parse("x", "---\nrequired_fields: [\n---\nbody").unwrap_err();
        assert!(matches!(err, LoadError::FrontMatter { .. }));
        let err = TemplateDefinition::parse("x", "{% if %}").unwrap_err();
        assert!(matches!(err, LoadError::Body { .. }));
    }
}
