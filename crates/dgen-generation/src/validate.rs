//! Output validation
//!
//! A required field is present in template output when its path rendered to
//! non-empty text. Free-form Markdown from an AI provider has no paths, so
//! there a field counts as present when a heading or a `Label:` line names it.

use dgen_template::RenderOutput;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::collections::BTreeSet;

/// Longest text before `:` still treated as a label
const MAX_LABEL_LEN: usize = 64;

/// Required fields the renderer did not fill, in sorted order
#[must_use]
pub fn missing_in_render(required: &BTreeSet<String>, output: &RenderOutput) -> Vec<String> {
    required
        .iter()
        .filter(|field| !output.rendered_fields.contains(*field))
        .cloned()
        .collect()
}

/// Required fields with no heading or label in `markdown`, in sorted order
#[must_use]
pub fn missing_in_markdown(required: &BTreeSet<String>, markdown: &str) -> Vec<String> {
    let labels = markdown_labels(markdown);
    required
        .iter()
        .filter(|field| !labels.contains(&field_label(field)))
        .cloned()
        .collect()
}

/// Whether text still contains templating syntax
#[must_use]
pub fn has_placeholders(text: &str) -> bool {
    text.contains("{{") || text.contains("{%")
}

/// Human label of a field path: last segment, `_`/`-` as spaces
#[must_use]
pub fn field_label(path: &str) -> String {
    let last = path
        .rsplit('.')
        .find(|s| !s.is_empty() && s.parse::<usize>().is_err())
        .unwrap_or(path);
    normalize_label(last.trim_end_matches("[]"))
}

/// Title-cased label for prompts (`acceptance_criteria` → `Acceptance Criteria`)
#[must_use]
pub fn display_label(path: &str) -> String {
    field_label(path)
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized headings and `Label:` prefixes found in a Markdown document
#[must_use]
pub fn markdown_labels(markdown: &str) -> BTreeSet<String> {
    let mut labels = BTreeSet::new();
    let mut buffer = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => buffer.push_str(&text),
            Event::SoftBreak | Event::HardBreak => buffer.push('\n'),
            Event::Start(Tag::Heading { .. } | Tag::Item | Tag::Paragraph) => {
                collect_lines(&buffer, &mut labels);
                buffer.clear();
            }
            Event::End(TagEnd::Heading(_)) => {
                let heading = normalize_label(&buffer);
                if !heading.is_empty() {
                    labels.insert(heading);
                }
                buffer.clear();
            }
            Event::End(TagEnd::Paragraph | TagEnd::Item | TagEnd::TableCell) => {
                collect_lines(&buffer, &mut labels);
                buffer.clear();
            }
            _ => {}
        }
    }
    collect_lines(&buffer, &mut labels);
    labels
}

fn collect_lines(text: &str, labels: &mut BTreeSet<String>) {
    for line in text.lines() {
        if let Some((label, _)) = line.split_once(':') {
            let label = normalize_label(label);
            if !label.is_empty() && label.len() <= MAX_LABEL_LEN {
                labels.insert(label);
            }
        }
    }
}

fn normalize_label(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '_' | '-' => ' ',
            c => c.to_ascii_lowercase(),
        })
        .filter(|c| !matches!(c, '*' | '#' | ':' | '`'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn labels_from_headings_and_label_lines() {
        let md = "# Title\n\nSome text.\n\n## Acceptance-Criteria\n\n- [ ] works\n\n**Priority:** High\n\n- Story points: 5\n";
        let labels = markdown_labels(md);
        assert!(labels.contains("title"));
        assert!(labels.contains("acceptance criteria"));
        assert!(labels.contains("priority"));
        assert!(labels.contains("story points"));
        assert!(!labels.contains("some text."));
    }

    #[test]
    fn markdown_validation_uses_last_segment() {
        let required = fields(&["title", "metrics.priority", "acceptance_criteria"]);
        let md = "## Title\nLogin\n\n## Acceptance Criteria\n- works\n";
        assert_eq!(missing_in_markdown(&required, md), vec!["metrics.priority".to_string()]);
    }

    #[test]
    fn render_validation_uses_rendered_paths() {
        let output = RenderOutput {
            text: "x".into(),
            unresolved_fields: BTreeSet::new(),
            rendered_fields: fields(&["title"]),
        };
        assert_eq!(
            missing_in_render(&fields(&["title", "description"]), &output),
            vec!["description".to_string()]
        );
    }

    #[test]
    fn labels_for_prompts() {
        assert_eq!(field_label("metrics.story_points"), "story points");
        assert_eq!(display_label("acceptance_criteria"), "Acceptance Criteria");
        assert_eq!(display_label("design.component-names"), "Component Names");
    }

    #[test]
    fn detects_placeholders() {
        assert!(has_placeholders("Hello {{ name }}"));
        assert!(!has_placeholders("Hello {name}"));
    }
}
