//! Error types for template loading, parsing, rendering and resolution
//!
//! Only [`TemplateError::BuiltInCorrupted`] ever escapes the resolver; every
//! other failure is recovered by falling through to the next tier.

/// Errors while parsing template source
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Malformed tag or expression
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Filter name not known to the renderer
    #[error("unknown filter '{name}' on line {line}")]
    UnknownFilter { line: usize, name: String },

    /// Filter called with the wrong number of arguments
    #[error("filter '{name}' on line {line} takes {expected} argument(s), got {actual}")]
    FilterArity {
        line: usize,
        name: String,
        expected: String,
        actual: usize,
    },

    /// Block opened but never closed
    #[error("unclosed '{tag}' block opened on line {line}")]
    Unclosed { line: usize, tag: String },

    /// Closing or continuation tag without a matching opener
    #[error("unexpected '{tag}' on line {line}")]
    Unexpected { line: usize, tag: String },
}

impl ParseError {
    /// Create syntax error
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Line the error was detected on
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Syntax { line, .. }
            | Self::UnknownFilter { line, .. }
            | Self::FilterArity { line, .. }
            | Self::Unclosed { line, .. }
            | Self::Unexpected { line, .. } => *line,
        }
    }
}

/// Errors while rendering a template
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Template failed to parse
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Rendered output exceeded the configured bound
    #[error("rendered output exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },
}

/// Errors while loading template sources
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// IO error reading the source
    #[error("io error reading {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Front matter block is not valid YAML
    #[error("invalid front matter in {location}: {message}")]
    FrontMatter { location: String, message: String },

    /// Body does not parse
    #[error("invalid template body in {location}: {source}")]
    Body {
        location: String,
        #[source]
        source: ParseError,
    },
}

impl LoadError {
    /// Create IO error for location
    pub fn io_error(location: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            location: location.into(),
            source,
        }
    }
}

/// Combined template error
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// The embedded last-resort tier failed; never expected in practice
    #[error("built-in template for '{document_type}' is corrupted: {source}")]
    BuiltInCorrupted {
        document_type: String,
        #[source]
        source: ParseError,
    },
}

/// Result type alias for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;
