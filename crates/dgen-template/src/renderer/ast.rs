//! Template syntax tree

use super::filters::Filter;
use serde_json::Value;
use std::fmt;

/// Compiled template
///
/// Produced by [`TemplateRenderer::compile`](super::TemplateRenderer::compile);
/// immutable and cheap to share.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub(crate) nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Output(Expr),
    If(IfBlock),
    For(ForBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expr {
    pub(crate) operand: Operand,
    pub(crate) filters: Vec<FilterCall>,
    pub(crate) line: usize,
}

impl Expr {
    pub(crate) fn has_default(&self) -> bool {
        self.filters.iter().any(|f| f.filter == Filter::Default)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Path(Path),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FilterCall {
    pub(crate) filter: Filter,
    pub(crate) args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Condition {
    Test(Expr),
    Not(Box<Condition>),
    Eq(Expr, Expr),
    Ne(Expr, Expr),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IfBlock {
    pub(crate) branches: Vec<(Condition, Vec<Node>)>,
    pub(crate) otherwise: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ForBlock {
    pub(crate) var: String,
    pub(crate) iterable: Path,
    pub(crate) body: Vec<Node>,
    pub(crate) line: usize,
}

/// One segment of a dotted path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Array index
    Index(usize),
}

/// Dotted property path (`design.component_names.0`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub(crate) fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// First key, if the path starts with one
    #[must_use]
    pub fn root(&self) -> Option<&str> {
        match self.segments.first() {
            Some(PathSegment::Key(k)) => Some(k),
            _ => None,
        }
    }

    /// Everything after the first segment
    #[must_use]
    pub fn tail(&self) -> &[PathSegment] {
        self.segments.get(1..).unwrap_or(&[])
    }

    /// Last key in the path
    #[must_use]
    pub fn last_key(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|s| match s {
            PathSegment::Key(k) => Some(k.as_str()),
            PathSegment::Index(_) => None,
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_segments(f, &self.segments)
    }
}

pub(crate) fn write_segments(f: &mut impl fmt::Write, segments: &[PathSegment]) -> fmt::Result {
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            f.write_char('.')?;
        }
        match seg {
            PathSegment::Key(k) => f.write_str(k)?,
            PathSegment::Index(n) => write!(f, "{n}")?,
        }
    }
    Ok(())
}

pub(crate) fn segments_to_string(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_segments(&mut out, segments);
    out
}
