//! dgen command-line interface
//!
//! No AI provider is wired into the binary, so `render` always takes the
//! emergency path. Logs go to stderr and command output to stdout.

#![warn(unreachable_pub)]

pub mod logging;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use dgen_core::{DesignPipeline, GenerateRequest, PipelineConfig};
use dgen_generation::DisabledProvider;
use dgen_model::RawInput;
use logging::LogFormat;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "dgen")]
#[command(about = "Generate documents from design selections", version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Template root (overrides `templates.root`)
    #[arg(long, global = true)]
    pub templates: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Default log filter when `DGEN_LOG` is unset
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// dgen subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a document for a design extraction
    Render {
        /// Design JSON file, `-` for stdin
        #[arg(short, long)]
        input: PathBuf,

        /// Target platform, e.g. `jira`
        #[arg(long)]
        platform: String,

        /// Document type, e.g. `ticket`
        #[arg(long)]
        doc_type: String,

        /// Technology stack; empty skips the tech-specific tier
        #[arg(long, default_value = "")]
        tech_stack: String,

        /// Strategy name; legacy names are accepted
        #[arg(long)]
        strategy: Option<String>,
    },
    /// Show which template a request would use
    Resolve {
        /// Target platform, e.g. `jira`
        #[arg(long)]
        platform: String,

        /// Document type, e.g. `ticket`
        #[arg(long)]
        doc_type: String,

        /// Technology stack; empty skips the tech-specific tier
        #[arg(long, default_value = "")]
        tech_stack: String,
    },
    /// Print the cache fingerprint of a design extraction
    Fingerprint {
        /// Design JSON file, `-` for stdin
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Build the pipeline from CLI flags
///
/// # Errors
/// If the configuration file cannot be loaded or is invalid.
pub fn build_pipeline(cli: &Cli) -> anyhow::Result<DesignPipeline> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(root) = &cli.templates {
        config = config.with_template_root(root);
    }
    let pipeline = DesignPipeline::builder(config)
        .with_provider(Arc::new(DisabledProvider))
        .build()?;
    Ok(pipeline)
}

/// Read and parse a design extraction
///
/// # Errors
/// If the file cannot be read or is not a valid extraction.
pub async fn read_input(path: &Path) -> anyhow::Result<RawInput> {
    let text = if path == Path::new("-") {
        let mut buffer = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buffer)
            .await
            .context("reading design from stdin")?;
        buffer
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("parsing design extraction {}", path.display()))
}

/// Execute a command and return what should be printed
///
/// # Errors
/// Input, configuration and generation failures.
pub async fn run(cli: &Cli) -> anyhow::Result<String> {
    match &cli.command {
        Command::Render {
            input,
            platform,
            doc_type,
            tech_stack,
            strategy,
        } => {
            let pipeline = build_pipeline(cli)?;
            let mut request = GenerateRequest::new(read_input(input).await?, platform, doc_type, tech_stack);
            if let Some(strategy) = strategy {
                request = request.with_strategy(strategy);
            }
            let document = pipeline.generate(&request).await?;
            if document.low_confidence {
                tracing::warn!(confidence = document.confidence, "low-confidence document");
            }
            if cli.json {
                Ok(serde_json::to_string_pretty(&document)?)
            } else {
                Ok(document.content)
            }
        }
        Command::Resolve {
            platform,
            doc_type,
            tech_stack,
        } => {
            let pipeline = build_pipeline(cli)?;
            let resolved = pipeline.resolve(platform, doc_type, tech_stack).await?;
            let template = &resolved.template;
            if cli.json {
                Ok(serde_json::to_string_pretty(&json!({
                    "key": template.key.to_string(),
                    "tier": template.tier().to_string(),
                    "location": template.resolution_path.location,
                    "required_fields": template.required_fields,
                }))?)
            } else {
                Ok(format!("{}\t{}", template.tier(), template.resolution_path.location))
            }
        }
        Command::Fingerprint { input } => {
            let fingerprint = read_input(input).await?.fingerprint();
            if cli.json {
                Ok(json!({ "fingerprint": fingerprint.to_string() }).to_string())
            } else {
                Ok(fingerprint.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_flags() {
        let cli = Cli::try_parse_from([
            "dgen", "render", "--input", "design.json", "--platform", "jira", "--doc-type", "ticket",
            "--tech-stack", "react", "--strategy", "fallback", "--json", "--log-format", "json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Command::Render {
                doc_type, strategy, ..
            } => {
                assert_eq!(doc_type, "ticket");
                assert_eq!(strategy.as_deref(), Some("fallback"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn tech_stack_is_optional() {
        let cli = Cli::try_parse_from(["dgen", "resolve", "--platform", "jira", "--doc-type", "story"]).unwrap();
        assert!(matches!(cli.command, Command::Resolve { tech_stack, .. } if tech_stack.is_empty()));
    }

    #[test]
    fn render_requires_input() {
        assert!(Cli::try_parse_from(["dgen", "render", "--platform", "jira", "--doc-type", "ticket"]).is_err());
    }
}
