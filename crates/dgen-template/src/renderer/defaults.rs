//! Intelligent defaults for unresolved fields
//!
//! When a template references a path the scope cannot satisfy, the renderer
//! asks the [`DefaultPolicy`] for a value keyed on the path's last segment.
//! Where possible the default is derived from computed metrics or the design
//! summary already in scope, so the placeholder still says something true.

use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Used when no rule matches
pub const GENERIC_DEFAULT: &str = "See attached design for details.";

const DEFAULT_TITLE: &str = "Implement selected design";
const DEFAULT_DESCRIPTION: &str = "Implement the selected design as shown in the attached mockups.";

/// Default-value policy for missing template fields
#[derive(Debug, Clone, Default)]
pub struct DefaultPolicy {
    overrides: BTreeMap<String, Value>,
}

impl DefaultPolicy {
    /// Create the standard policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default for a field name (last path segment)
    #[must_use]
    pub fn with_override(mut self, field: impl AsRef<str>, value: Value) -> Self {
        self.overrides.insert(normalize(field.as_ref()), value);
        self
    }

    /// Default for a single value
    ///
    /// Never returns a value that stringifies to empty text.
    #[must_use]
    pub fn value_for(&self, field: &str, scope: &Value) -> Value {
        let field = normalize(field);
        if let Some(value) = self.overrides.get(&field) {
            return value.clone();
        }
        match field.as_str() {
            "priority" => from_scope(scope, &["metrics", "priority"]).unwrap_or_else(|| json!("medium")),
            "complexity" | "complexity_band" => {
                from_scope(scope, &["metrics", "complexity_band"]).unwrap_or_else(|| json!("medium"))
            }
            "complexity_score" => from_scope(scope, &["metrics", "complexity"]).unwrap_or_else(|| json!(1.0)),
            "effort" | "estimate" | "estimated_effort" => {
                from_scope(scope, &["metrics", "effort"]).unwrap_or_else(|| json!("3-5 days"))
            }
            "story_points" | "points" => {
                from_scope(scope, &["metrics", "story_points"]).unwrap_or_else(|| json!(3))
            }
            "title" | "name" | "summary" => {
                from_scope(scope, &["title"]).unwrap_or_else(|| json!(DEFAULT_TITLE))
            }
            "description" => {
                from_scope(scope, &["description"]).unwrap_or_else(|| json!(DEFAULT_DESCRIPTION))
            }
            "acceptance_criteria" | "criteria" => json!([
                "Implementation matches the attached design",
                "All interactive states behave as designed",
                "Layout adapts to supported screen sizes"
            ]),
            "test_cases" | "scenarios" => json!([
                "Verify the layout matches the attached design",
                "Verify every interactive element responds as designed",
                "Verify empty, loading and error states"
            ]),
            "colors" => json!("Use the design system color tokens."),
            "typography" | "fonts" => json!("Use the design system typography scale."),
            "components" | "component_names" => from_scope(scope, &["design", "component_names"])
                .unwrap_or_else(|| json!(["See attached design"])),
            "labels" | "tags" => json!(["design"]),
            "assignee" | "owner" | "reporter" => json!("Unassigned"),
            "domain" => json!("general"),
            "user_stories" | "stories" => json!([
                "As a user, I want the selected design implemented so that I can use it."
            ]),
            "issues" | "findings" => json!(["No automated findings; review manually"]),
            "confidence" => from_scope(scope, &["confidence"]).unwrap_or_else(|| json!(0)),
            _ => json!(GENERIC_DEFAULT),
        }
    }

    /// Default for a field iterated by a loop
    #[must_use]
    pub fn sequence_for(&self, field: &str, scope: &Value) -> Vec<Value> {
        match self.value_for(field, scope) {
            Value::Array(items) if !items.is_empty() => items,
            Value::Array(_) => vec![json!(GENERIC_DEFAULT)],
            other => vec![other],
        }
    }
}

fn normalize(field: &str) -> String {
    field.trim().to_ascii_lowercase().replace('-', "_")
}

fn from_scope(scope: &Value, path: &[&str]) -> Option<Value> {
    let mut current = scope;
    for key in path {
        current = current.get(key)?;
    }
    let non_empty = match current {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    };
    non_empty.then(|| current.clone())
}
