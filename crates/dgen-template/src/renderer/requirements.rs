//! Static field requirements of a compiled template

use super::ast::{segments_to_string, Node, Operand, PathSegment, Program};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// How a template uses a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUsage {
    /// Interpolated directly
    Value,
    /// Iterated by a `for` loop; item fields are relative to each item
    Sequence { item_fields: Vec<FieldRequirement> },
}

/// One field a template interpolates or iterates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRequirement {
    /// Dotted path, relative to the enclosing loop item for item fields
    pub path: String,
    pub segments: Vec<PathSegment>,
    pub usage: FieldUsage,
    /// Every use sits inside an `if` branch
    pub conditional: bool,
}

impl FieldRequirement {
    fn new(segments: Vec<PathSegment>, usage: FieldUsage, conditional: bool) -> Self {
        Self {
            path: segments_to_string(&segments),
            segments,
            usage,
            conditional,
        }
    }

    /// Last key segment, used to choose a default
    #[must_use]
    pub fn field_name(&self) -> &str {
        self.segments
            .iter()
            .rev()
            .find_map(|s| match s {
                PathSegment::Key(k) => Some(k.as_str()),
                PathSegment::Index(_) => None,
            })
            .unwrap_or("")
    }

    /// Whether this field is iterated
    #[inline]
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        matches!(self.usage, FieldUsage::Sequence { .. })
    }

    /// Flattened display paths, item fields as `iterable[].field`
    #[must_use]
    pub fn display_paths(&self) -> Vec<String> {
        let mut out = vec![self.path.clone()];
        if let FieldUsage::Sequence { item_fields } = &self.usage {
            for item in item_fields {
                out.extend(
                    item.display_paths()
                        .into_iter()
                        .map(|p| format!("{}[].{p}", self.path)),
                );
            }
        }
        out
    }
}

type Fields = BTreeMap<String, FieldRequirement>;

struct Frame {
    var: String,
    fields: Fields,
}

fn insert(fields: &mut Fields, req: FieldRequirement) {
    match fields.entry(req.path.clone()) {
        Entry::Vacant(slot) => {
            slot.insert(req);
        }
        Entry::Occupied(mut slot) => merge(slot.get_mut(), req),
    }
}

fn merge(existing: &mut FieldRequirement, incoming: FieldRequirement) {
    existing.conditional &= incoming.conditional;
    let FieldUsage::Sequence { item_fields: more } = incoming.usage else {
        return;
    };
    match &mut existing.usage {
        FieldUsage::Sequence { item_fields } => {
            let mut merged: Fields = item_fields
                .drain(..)
                .map(|f| (f.path.clone(), f))
                .collect();
            for field in more {
                insert(&mut merged, field);
            }
            item_fields.extend(merged.into_values());
        }
        usage => *usage = FieldUsage::Sequence { item_fields: more },
    }
}

/// Which loop frame (if any) a path is relative to
enum Target {
    Top,
    Frame(usize),
    Skip,
}

fn target(frames: &[Frame], root: Option<&str>, tail_empty: bool) -> Target {
    let Some(root) = root else {
        return Target::Skip;
    };
    if root == "loop" && !frames.is_empty() {
        return Target::Skip;
    }
    match frames.iter().rposition(|f| f.var == root) {
        Some(_) if tail_empty => Target::Skip,
        Some(idx) => Target::Frame(idx),
        None => Target::Top,
    }
}

fn collect(nodes: &[Node], frames: &mut Vec<Frame>, top: &mut Fields, conditional: bool) {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Output(expr) => {
                let Operand::Path(path) = &expr.operand else {
                    continue;
                };
                match target(frames, path.root(), path.tail().is_empty()) {
                    Target::Top => insert(
                        top,
                        FieldRequirement::new(path.segments().to_vec(), FieldUsage::Value, conditional),
                    ),
                    Target::Frame(idx) => insert(
                        &mut frames[idx].fields,
                        FieldRequirement::new(path.tail().to_vec(), FieldUsage::Value, conditional),
                    ),
                    Target::Skip => {}
                }
            }
            Node::If(block) => {
                for (_, body) in &block.branches {
                    collect(body, frames, top, true);
                }
                collect(&block.otherwise, frames, top, true);
            }
            Node::For(block) => {
                let path = &block.iterable;
                let dest = target(frames, path.root(), path.tail().is_empty());
                frames.push(Frame {
                    var: block.var.clone(),
                    fields: Fields::new(),
                });
                collect(&block.body, frames, top, conditional);
                let item_fields = frames
                    .pop()
                    .map(|f| f.fields.into_values().collect())
                    .unwrap_or_default();
                let usage = FieldUsage::Sequence { item_fields };
                match dest {
                    Target::Top => {
                        insert(
                            top,
                            FieldRequirement::new(path.segments().to_vec(), usage, conditional),
                        );
                    }
                    Target::Frame(idx) => insert(
                        &mut frames[idx].fields,
                        FieldRequirement::new(path.tail().to_vec(), usage, conditional),
                    ),
                    Target::Skip => {}
                }
            }
        }
    }
}

impl Program {
    /// Fields this template interpolates or iterates, deduplicated and
    /// sorted by path
    #[must_use]
    pub fn requirements(&self) -> Vec<FieldRequirement> {
        let mut top = Fields::new();
        collect(&self.nodes, &mut Vec::new(), &mut top, false);
        top.into_values().collect()
    }
}
