//! Deterministic scope completion
//!
//! Before an emergency render every field the template needs is written into
//! the scope, so the renderer never has to fall back to a per-path default
//! and the output has no unresolved fields.
//!
//! Rules, applied per field requirement:
//! - present and non-blank: left alone (existing sequences still get their
//!   item fields completed);
//! - unconditional: filled from the [`DefaultPolicy`], creating parents;
//! - conditional (only used inside `if` branches): not created up front, so
//!   an absent section stays absent and its branch stays closed. Items of an
//!   existing sequence are still completed, since their branch is open.
//!
//! A render can still open a branch whose fields are absent (`{% if title %}
//! {{ owner }}{% endif %}`). [`prefill_reached`] fills exactly those fields,
//! using the render's unresolved set as the list of branches taken.

use dgen_template::{DefaultPolicy, FieldRequirement, FieldUsage, PathSegment};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Fill every missing field of `requirements` in `scope`
pub fn prefill(scope: &mut Value, requirements: &[FieldRequirement], policy: &DefaultPolicy) {
    let snapshot = scope.clone();
    fill(scope, requirements, policy, &snapshot);
}

/// Fill conditional fields a render reached but could not resolve
///
/// Returns whether the scope changed, i.e. whether another render can do
/// better.
pub fn prefill_reached(
    scope: &mut Value,
    requirements: &[FieldRequirement],
    unresolved: &BTreeSet<String>,
    policy: &DefaultPolicy,
) -> bool {
    let reached: Vec<FieldRequirement> = requirements
        .iter()
        .filter(|r| r.conditional && unresolved.contains(&r.path))
        .cloned()
        .collect();
    if reached.is_empty() {
        return false;
    }
    let before = scope.clone();
    fill(scope, &unconditional(&reached), policy, &before);
    *scope != before
}

fn fill(target: &mut Value, requirements: &[FieldRequirement], policy: &DefaultPolicy, root: &Value) {
    for requirement in requirements {
        fill_one(target, requirement, policy, root);
    }
}

fn fill_one(target: &mut Value, requirement: &FieldRequirement, policy: &DefaultPolicy, root: &Value) {
    let Some(keys) = key_path(&requirement.segments) else {
        return;
    };
    let Some((last, parents)) = keys.split_last() else {
        return;
    };

    if requirement.conditional {
        if let FieldUsage::Sequence { item_fields } = &requirement.usage {
            if let Some(Value::Array(items)) =
                existing_object(target, parents).and_then(|p| p.get_mut(*last))
            {
                complete_items(items, item_fields, policy, root);
            }
        }
        return;
    }

    let Some(parent) = create_objects(target, parents) else {
        return;
    };
    let slot = parent.entry((*last).to_string()).or_insert(Value::Null);
    match &requirement.usage {
        FieldUsage::Value => {
            if is_blank(slot) {
                *slot = policy.value_for(requirement.field_name(), root);
            }
        }
        FieldUsage::Sequence { item_fields } => {
            if is_blank(slot) {
                *slot = default_sequence(requirement.field_name(), item_fields, policy, root);
            } else if let Value::Array(items) = slot {
                complete_items(items, item_fields, policy, root);
            }
        }
    }
}

fn complete_items(items: &mut [Value], item_fields: &[FieldRequirement], policy: &DefaultPolicy, root: &Value) {
    let item_fields = unconditional(item_fields);
    for item in items.iter_mut().filter(|i| i.is_object()) {
        fill(item, &item_fields, policy, root);
    }
}

fn unconditional(fields: &[FieldRequirement]) -> Vec<FieldRequirement> {
    fields
        .iter()
        .cloned()
        .map(|mut f| {
            f.conditional = false;
            f
        })
        .collect()
}

fn default_sequence(
    field: &str,
    item_fields: &[FieldRequirement],
    policy: &DefaultPolicy,
    root: &Value,
) -> Value {
    if item_fields.is_empty() {
        return Value::Array(policy.sequence_for(field, root));
    }
    let mut item = Value::Object(Map::new());
    fill(&mut item, &unconditional(item_fields), policy, root);
    Value::Array(vec![item])
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Key-only paths; indexed paths cannot be created and are skipped
fn key_path(segments: &[PathSegment]) -> Option<Vec<&str>> {
    segments
        .iter()
        .map(|s| match s {
            PathSegment::Key(k) => Some(k.as_str()),
            PathSegment::Index(_) => None,
        })
        .collect()
}

fn existing_object<'a>(target: &'a mut Value, keys: &[&str]) -> Option<&'a mut Map<String, Value>> {
    let mut current = target;
    for key in keys {
        current = current.as_object_mut()?.get_mut(*key)?;
    }
    current.as_object_mut()
}

fn create_objects<'a>(target: &'a mut Value, keys: &[&str]) -> Option<&'a mut Map<String, Value>> {
    if target.is_null() {
        *target = Value::Object(Map::new());
    }
    let mut current = target;
    for key in keys {
        let map = current.as_object_mut()?;
        let next = map
            .entry((*key).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if next.is_null() {
            *next = Value::Object(Map::new());
        }
        current = next;
    }
    current.as_object_mut()
}
