//! Built-in templates compiled into the binary
//!
//! The last resolution tier. Any document type without its own built-in
//! uses the `ticket` body.

use crate::definition::TemplateDefinition;
use crate::error::{LoadError, ParseError, TemplateError};

/// Document type whose body backs unknown types
pub const FALLBACK_DOCUMENT_TYPE: &str = "ticket";

const BUILTINS: [(&str, &str); 4] = [
    ("ticket", include_str!("../templates/ticket.tpl")),
    ("story", include_str!("../templates/story.tpl")),
    ("documentation", include_str!("../templates/documentation.tpl")),
    ("test-plan", include_str!("../templates/test-plan.tpl")),
];

/// Document types that have a dedicated built-in
#[must_use]
pub fn builtin_document_types() -> Vec<&'static str> {
    BUILTINS.iter().map(|(name, _)| *name).collect()
}

/// Name and raw source of the built-in serving `document_type`
#[must_use]
pub fn builtin_source(document_type: &str) -> (&'static str, &'static str) {
    BUILTINS
        .iter()
        .find(|(name, _)| *name == document_type)
        .or_else(|| BUILTINS.iter().find(|(name, _)| *name == FALLBACK_DOCUMENT_TYPE))
        .copied()
        .unwrap_or(BUILTINS[0])
}

/// Namespace location reported for a built-in
#[must_use]
pub fn builtin_location(name: &str) -> String {
    format!("builtin/{name}")
}

/// Parse the built-in serving `document_type`
///
/// # Errors
/// `TemplateError::BuiltInCorrupted` if the embedded source does not parse.
pub fn load_builtin(document_type: &str) -> Result<TemplateDefinition, TemplateError> {
    let (name, raw) = builtin_source(document_type);
    TemplateDefinition::parse(&builtin_location(name), raw).map_err(|e| {
        let source = match e {
            LoadError::Body { source, .. } => source,
            other => ParseError::syntax(1, other.to_string()),
        };
        TemplateError::BuiltInCorrupted {
            document_type: name.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_parses_and_declares_required_fields() {
        for name in builtin_document_types() {
            let def = load_builtin(name).unwrap();
            assert_eq!(def.location, builtin_location(name));
            assert!(
                def.front_matter.required_fields.contains("title"),
                "{name} must require a title"
            );
        }
    }

    #[test]
    fn unknown_types_use_ticket() {
        assert_eq!(builtin_source("release-notes").0, "ticket");
        assert_eq!(builtin_source("story").0, "story");
    }
}
