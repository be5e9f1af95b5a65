//! Prompts for the three primary sub-steps
//!
//! Each step sees less of the context than the one before it:
//! the full render scope, then the context summary and sections, then only
//! the selection's own description and text.

use crate::validate::display_label;
use dgen_model::{Context, DesignSummary, Template};
use dgen_template::FieldRequirement;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Step (a): ask for a JSON object keyed by the template's fields
#[must_use]
pub fn context_guided(template: &Template, requirements: &[FieldRequirement], scope: &Value) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are preparing a {} for {} ({} stack).",
        template.document_type(),
        template.platform(),
        template.tech_stack()
    );
    prompt.push_str(
        "Return a single JSON object and nothing else. Use these keys; dotted keys \
         denote nested objects and keys ending in [] are lists of objects:\n",
    );
    for requirement in requirements {
        for path in requirement.display_paths() {
            let marker = if template.required_fields.contains(&path) {
                " (required)"
            } else {
                ""
            };
            let _ = writeln!(prompt, "- {path}{marker}");
        }
    }
    prompt.push_str("\nDesign context:\n");
    prompt.push_str(&serde_json::to_string_pretty(scope).unwrap_or_default());
    prompt.push_str("\n\nThe values will be placed into this template:\n");
    prompt.push_str(&template.body);
    prompt.push('\n');
    prompt
}

/// Step (b): Markdown from the context summary and successful sections
#[must_use]
pub fn summary_only(context: &Context, template: &Template) -> String {
    let mut prompt = header(template);
    let summary = &context.summary;
    describe_summary(&mut prompt, summary);

    let metrics = &context.computed_metrics;
    let _ = writeln!(
        prompt,
        "Complexity: {} ({:.1}/10), priority {}, estimated effort {}.",
        metrics.complexity_band, metrics.complexity, metrics.priority, metrics.estimated_effort.label
    );
    for section in context.successful_sections() {
        let _ = writeln!(
            prompt,
            "{} analysis: {}",
            section.analyzer_id,
            section.data.to_value()
        );
    }
    push_headings(&mut prompt, &template.required_fields);
    prompt
}

/// Step (c): Markdown from the raw description and selection only
#[must_use]
pub fn raw_description(summary: &DesignSummary, template: &Template) -> String {
    let mut prompt = header(template);
    describe_summary(&mut prompt, summary);
    push_headings(&mut prompt, &template.required_fields);
    prompt
}

fn header(template: &Template) -> String {
    format!(
        "Write a {} for {} in Markdown for a {} implementation.\n",
        template.document_type(),
        template.platform(),
        template.tech_stack()
    )
}

fn describe_summary(prompt: &mut String, summary: &DesignSummary) {
    let _ = writeln!(prompt, "Design: {}", summary.title);
    if let Some(page) = &summary.page {
        let _ = writeln!(prompt, "Page: {page}");
    }
    if let Some(description) = &summary.description {
        let _ = writeln!(prompt, "Description: {description}");
    }
    if !summary.component_names.is_empty() {
        let _ = writeln!(prompt, "Components: {}", summary.component_names.join(", "));
    }
    if !summary.text_samples.is_empty() {
        let _ = writeln!(prompt, "Visible text: {}", summary.text_samples.join(" | "));
    }
}

fn push_headings(prompt: &mut String, required: &BTreeSet<String>) {
    if required.is_empty() {
        return;
    }
    prompt.push_str("\nInclude a Markdown heading for each of the following sections:\n");
    for field in required {
        let _ = writeln!(prompt, "## {}", display_label(field));
    }
}
