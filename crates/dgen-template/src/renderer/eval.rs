//! Tree-walking evaluator

use super::ast::{segments_to_string, Condition, Expr, ForBlock, Node, Operand, Path, PathSegment};
use super::defaults::DefaultPolicy;
use super::value::{is_truthy, loose_eq, stringify};
use super::RenderOutput;
use crate::error::RenderError;
use serde_json::{json, Value};
use std::collections::BTreeSet;

struct LoopFrame {
    var: String,
    item: Value,
    index: usize,
    len: usize,
    /// Display prefix for paths relative to the item, e.g. `stories[]`
    display: String,
}

impl LoopFrame {
    fn meta(&self) -> Value {
        json!({
            "index": self.index + 1,
            "index0": self.index,
            "first": self.index == 0,
            "last": self.index + 1 == self.len,
            "length": self.len,
        })
    }
}

/// Result of resolving a path against the scope
struct Lookup {
    value: Option<Value>,
    display: String,
}

pub(crate) struct Evaluator<'a> {
    root: &'a Value,
    policy: &'a DefaultPolicy,
    limit: usize,
    frames: Vec<LoopFrame>,
    out: String,
    unresolved: BTreeSet<String>,
    rendered: BTreeSet<String>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(root: &'a Value, policy: &'a DefaultPolicy, limit: usize) -> Self {
        Self {
            root,
            policy,
            limit,
            frames: Vec::new(),
            out: String::new(),
            unresolved: BTreeSet::new(),
            rendered: BTreeSet::new(),
        }
    }

    pub(crate) fn run(mut self, nodes: &[Node]) -> Result<RenderOutput, RenderError> {
        self.nodes(nodes)?;
        Ok(RenderOutput {
            text: self.out,
            unresolved_fields: self.unresolved,
            rendered_fields: self.rendered,
        })
    }

    fn nodes(&mut self, nodes: &[Node]) -> Result<(), RenderError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.push(text)?,
                Node::Output(expr) => self.output(expr)?,
                Node::If(block) => {
                    let body = block
                        .branches
                        .iter()
                        .find(|(cond, _)| self.condition(cond))
                        .map_or(&block.otherwise, |(_, body)| body);
                    self.nodes(body)?;
                }
                Node::For(block) => self.for_loop(block)?,
            }
        }
        Ok(())
    }

    fn push(&mut self, text: &str) -> Result<(), RenderError> {
        if self.out.len() + text.len() > self.limit {
            return Err(RenderError::OutputTooLarge { limit: self.limit });
        }
        self.out.push_str(text);
        Ok(())
    }

    fn lookup(&self, path: &Path) -> Lookup {
        let root = path.root().unwrap_or("");
        if root == "loop" {
            if let Some(frame) = self.frames.last() {
                let meta = frame.meta();
                return Lookup {
                    value: get(&meta, path.tail()).cloned(),
                    display: path.to_string(),
                };
            }
        }
        if let Some(frame) = self.frames.iter().rev().find(|f| f.var == root) {
            let tail = path.tail();
            let display = if tail.is_empty() {
                frame.display.clone()
            } else {
                format!("{}.{}", frame.display, segments_to_string(tail))
            };
            return Lookup {
                value: get(&frame.item, tail).cloned(),
                display,
            };
        }
        Lookup {
            value: get(self.root, path.segments()).cloned(),
            display: path.to_string(),
        }
    }

    fn output(&mut self, expr: &Expr) -> Result<(), RenderError> {
        let (value, display) = match &expr.operand {
            Operand::Literal(v) => (v.clone(), None),
            Operand::Path(path) => {
                let found = self.lookup(path);
                match found.value {
                    Some(v) => (v, Some(found.display)),
                    None => {
                        self.unresolved.insert(found.display);
                        let fallback = if expr.has_default() {
                            Value::Null
                        } else {
                            self.policy
                                .value_for(path.last_key().unwrap_or_default(), self.root)
                        };
                        (fallback, None)
                    }
                }
            }
        };
        let value = apply_filters(expr, value);
        let text = stringify(&value);
        if let Some(display) = display {
            if !text.trim().is_empty() {
                self.rendered.insert(display);
            }
        }
        self.push(&text)
    }

    fn eval_quiet(&self, expr: &Expr) -> Value {
        let value = match &expr.operand {
            Operand::Literal(v) => v.clone(),
            Operand::Path(path) => self.lookup(path).value.unwrap_or(Value::Null),
        };
        apply_filters(expr, value)
    }

    fn condition(&self, cond: &Condition) -> bool {
        match cond {
            Condition::Test(expr) => is_truthy(&self.eval_quiet(expr)),
            Condition::Not(inner) => !self.condition(inner),
            Condition::Eq(a, b) => loose_eq(&self.eval_quiet(a), &self.eval_quiet(b)),
            Condition::Ne(a, b) => !loose_eq(&self.eval_quiet(a), &self.eval_quiet(b)),
            Condition::And(all) => all.iter().all(|c| self.condition(c)),
            Condition::Or(any) => any.iter().any(|c| self.condition(c)),
        }
    }

    fn for_loop(&mut self, block: &ForBlock) -> Result<(), RenderError> {
        let found = self.lookup(&block.iterable);
        let items = match found.value {
            Some(v) => {
                let items = iterate(v);
                if !items.is_empty() {
                    self.rendered.insert(found.display.clone());
                }
                items
            }
            None => {
                self.unresolved.insert(found.display.clone());
                self.policy
                    .sequence_for(block.iterable.last_key().unwrap_or_default(), self.root)
            }
        };

        let len = items.len();
        let display = format!("{}[]", found.display);
        for (index, item) in items.into_iter().enumerate() {
            self.frames.push(LoopFrame {
                var: block.var.clone(),
                item,
                index,
                len,
                display: display.clone(),
            });
            let result = self.nodes(&block.body);
            self.frames.pop();
            result?;
        }
        Ok(())
    }
}

fn apply_filters(expr: &Expr, value: Value) -> Value {
    expr.filters
        .iter()
        .fold(value, |acc, call| call.filter.apply(acc, &call.args))
}

/// Resolve segments; null counts as missing
fn get<'v>(value: &'v Value, segments: &[PathSegment]) -> Option<&'v Value> {
    let mut current = value;
    for seg in segments {
        current = match (current, seg) {
            (Value::Object(map), PathSegment::Key(k)) => map.get(k)?,
            (Value::Object(map), PathSegment::Index(i)) => map.get(&i.to_string())?,
            (Value::Array(items), PathSegment::Index(i)) => items.get(*i)?,
            _ => return None,
        };
    }
    (!current.is_null()).then_some(current)
}

/// Items a loop iterates: arrays by element, objects as `{key, value}`
/// entries, other non-empty values once
fn iterate(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| json!({ "key": key, "value": value }))
            .collect(),
        Value::Null => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        other => vec![other],
    }
}
