//! Template rendering
//!
//! A small, logic-light templating language:
//!
//! - `{{ path | filter(arg) }}` interpolates a dotted path
//! - `{% if cond %}...{% elif cond %}...{% else %}...{% endif %}`
//! - `{% for item in path %}...{% endfor %}` with `loop.index`, `loop.first`,
//!   `loop.last` available inside the body
//! - `{# comment #}`
//!
//! Conditions support `not`, `and`, `or`, `==` and `!=`. Null, `false`, `0`,
//! `""`, `[]` and `{}` are falsy.
//!
//! Rendering is total for any well-formed template: a missing or null
//! interpolated path is recorded in [`RenderOutput::unresolved_fields`] and
//! replaced by the [`DefaultPolicy`] value for its last segment. Only a
//! parse error or the output bound fails a render.

mod ast;
mod defaults;
mod eval;
mod expr;
mod filters;
mod lexer;
mod parser;
mod requirements;
mod value;

pub use ast::{Path, PathSegment, Program};
pub use defaults::{DefaultPolicy, GENERIC_DEFAULT};
pub use requirements::{FieldRequirement, FieldUsage};

use crate::error::{ParseError, RenderError};
use serde_json::Value;
use std::collections::BTreeSet;

/// Default bound on rendered output size
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Output of one render
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderOutput {
    pub text: String,
    /// Paths that had no value; loop item paths appear as `items[].field`
    pub unresolved_fields: BTreeSet<String>,
    /// Paths whose resolved value produced non-empty text
    pub rendered_fields: BTreeSet<String>,
}

impl RenderOutput {
    /// Whether every interpolated path had a value
    #[inline]
    #[must_use]
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved_fields.is_empty()
    }
}

/// Stateless template renderer
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    policy: DefaultPolicy,
    max_output_bytes: usize,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Create renderer with the standard default policy
    #[must_use]
    pub fn new() -> Self {
        Self {
            policy: DefaultPolicy::new(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    /// With custom default policy
    #[must_use]
    pub fn with_policy(mut self, policy: DefaultPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// With output bound
    #[must_use]
    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }

    /// Default policy in use
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &DefaultPolicy {
        &self.policy
    }

    /// Parse template source
    pub fn compile(body: &str) -> Result<Program, ParseError> {
        parser::parse(body)
    }

    /// Parse and render in one step
    pub fn render(&self, body: &str, scope: &Value) -> Result<RenderOutput, RenderError> {
        let program = Self::compile(body)?;
        self.render_program(&program, scope)
    }

    /// Render a compiled program
    pub fn render_program(
        &self,
        program: &Program,
        scope: &Value,
    ) -> Result<RenderOutput, RenderError> {
        eval::Evaluator::new(scope, &self.policy, self.max_output_bytes).run(&program.nodes)
    }

    /// Field requirements of template source
    pub fn requirements(body: &str) -> Result<Vec<FieldRequirement>, ParseError> {
        Ok(Self::compile(body)?.requirements())
    }
}
