//! Testing utilities for dgen workspace
//!
//! Shared fixtures and scripted collaborators.

#![allow(missing_docs)]

use async_trait::async_trait;
use dgen_context::{Analyzer, AnalyzerRegistry, CacheBackend, CacheError};
use dgen_core::{DesignPipeline, PipelineConfig};
use dgen_generation::{AiError, AiProvider};
use dgen_model::{
    AnalysisData, AnalyzerId, AnalyzerResult, DesignNode, NodeType, RawInput, StyleDefinition,
    StyleKind,
};
use dgen_template::{MemoryTemplateSource, TemplateSource};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Small login screen with styles, variants and one interaction
pub fn create_login_input() -> RawInput {
    RawInput::new("file-login")
        .with_page("Auth")
        .with_description("Email and password sign-in for returning users.")
        .with_styles(vec![
            StyleDefinition::new("S:primary", "Primary", StyleKind::Fill).with_value("#0055ff"),
            StyleDefinition::new("S:body", "Body", StyleKind::Text).with_value("Inter 16/24"),
        ])
        .with_nodes(vec![DesignNode::new("1:1", "Login", NodeType::Frame)
            .with_children(vec![
                DesignNode::new("1:2", "Title", NodeType::Text)
                    .with_text("Welcome back")
                    .with_styles(["S:body"]),
                DesignNode::new("1:3", "Email", NodeType::Instance).with_variants(["default", "error"]),
                DesignNode::new("1:4", "Password", NodeType::Instance).with_variants(["default", "error"]),
                DesignNode::new("1:5", "Sign in", NodeType::Instance)
                    .with_interaction("ON_CLICK", "NAVIGATE")
                    .with_styles(["S:primary"]),
            ])])
}

/// Deeper checkout screen with repeated line items
pub fn create_checkout_input() -> RawInput {
    let items = (1..=4)
        .map(|i| {
            DesignNode::new(format!("2:{i}"), format!("Line item {i}"), NodeType::Instance)
                .with_children(vec![DesignNode::new(format!("2:{i}:t"), "Label", NodeType::Text)
                    .with_text(format!("Item {i}"))])
        })
        .collect();
    RawInput::new("file-checkout")
        .with_page("Checkout")
        .with_nodes(vec![DesignNode::new("2:0", "Checkout", NodeType::Frame).with_children(vec![
            DesignNode::new("2:10", "Cart", NodeType::Group).with_children(items),
            DesignNode::new("2:20", "Pay", NodeType::Instance)
                .with_interaction("ON_CLICK", "NAVIGATE")
                .with_interaction("ON_HOVER", "CHANGE_TO"),
        ])])
}

pub fn create_empty_input() -> RawInput {
    RawInput::new("file-empty")
}

/// Login input as the JSON a plugin would send
pub fn create_design_json() -> String {
    serde_json::to_string_pretty(&create_login_input()).unwrap()
}

/// Scripted analyzer behaviour
#[derive(Debug, Clone, Copy)]
pub enum Script {
    /// Succeed at once with this confidence
    Succeed(f64),
    /// Return a failed result
    Fail,
    /// Panic inside `analyze`
    Panic,
    /// Sleep, then succeed with the confidence
    Delay(Duration, f64),
}

/// Analyzer that follows a [`Script`] and counts its calls
#[derive(Debug)]
pub struct ScriptedAnalyzer {
    id: &'static str,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAnalyzer {
    pub fn new(id: &'static str, script: Script) -> Self {
        Self {
            id,
            script,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter; stays valid after the analyzer moves into a registry
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    fn id(&self) -> AnalyzerId {
        AnalyzerId::from(self.id)
    }

    async fn analyze(&self, _input: &RawInput, _timeout: Duration) -> AnalyzerResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let data = AnalysisData::Custom(serde_json::json!({ "source": self.id }));
        match self.script {
            Script::Succeed(confidence) => AnalyzerResult::success(self.id, confidence, data),
            Script::Fail => AnalyzerResult::failed(self.id, "scripted failure"),
            Script::Panic => panic!("scripted panic in {}", self.id),
            Script::Delay(delay, confidence) => {
                tokio::time::sleep(delay).await;
                AnalyzerResult::success(self.id, confidence, data)
            }
        }
    }
}

/// Registry of [`ScriptedAnalyzer`]s, one per `(id, script)` pair
pub fn create_scripted_registry(scripts: &[(&'static str, Script)]) -> AnalyzerRegistry {
    scripts.iter().fold(AnalyzerRegistry::new(), |registry, &(id, script)| {
        registry.with(ScriptedAnalyzer::new(id, script)).unwrap()
    })
}

/// Provider answering from a queue of scripted responses
///
/// Once the queue is empty every call gets the fallback response, or
/// `AiError::Unavailable` when none is set.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    available: bool,
    responses: Mutex<VecDeque<Result<String, AiError>>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn available() -> Self {
        Self {
            available: true,
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().push_back(Ok(response.into()));
        self
    }

    #[must_use]
    pub fn with_error(self, error: AiError) -> Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, response: impl Into<String>) -> Self {
        self.fallback = Some(response.into());
        self
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl AiProvider for ScriptedProvider {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn generate(&self, prompt: &str, _max_timeout: Duration) -> Result<String, AiError> {
        self.prompts.lock().push(prompt.to_string());
        let next = self.responses.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.clone().ok_or(AiError::Unavailable))
    }
}

/// Ticket fields as the context-guided step returns them
pub fn create_ticket_json_response() -> String {
    serde_json::json!({
        "description": "Let returning users sign in with email and password.",
        "acceptance_criteria": [
            "Shows an inline error for an invalid email",
            "Navigates to the dashboard after sign-in"
        ]
    })
    .to_string()
}

/// Ticket as a Markdown answer with every required heading
pub fn create_ticket_markdown_response() -> String {
    "## Title\nLogin\n\n## Description\nSign-in form.\n\n## Acceptance Criteria\n- Validates email\n\n## Priority\nMedium\n"
        .to_string()
}

/// Cache backend whose every operation fails
#[derive(Debug, Default)]
pub struct FailingCacheBackend;

#[async_trait]
impl CacheBackend for FailingCacheBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn remove(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }
}

/// Template namespace with a custom default and a tech-specific ticket
pub fn create_template_source() -> MemoryTemplateSource {
    MemoryTemplateSource::new()
        .with_template(
            "jira/ticket/react",
            "---\nrequired_fields: [title, description]\n---\n# {{ title }} (React)\n\n{{ description }}\n",
        )
        .with_template(
            "custom/defaults/ticket",
            "---\nrequired_fields: [title]\n---\n# {{ title }}\n\nPriority: {{ metrics.priority | title }}\n",
        )
}

pub fn setup_test_pipeline(registry: AnalyzerRegistry, provider: Arc<dyn AiProvider>) -> DesignPipeline {
    setup_test_pipeline_with(registry, provider, Arc::new(create_template_source()))
}

pub fn setup_test_pipeline_with(
    registry: AnalyzerRegistry,
    provider: Arc<dyn AiProvider>,
    templates: Arc<dyn TemplateSource>,
) -> DesignPipeline {
    DesignPipeline::builder(PipelineConfig::new())
        .with_registry(registry)
        .with_provider(provider)
        .with_template_source(templates)
        .build()
        .unwrap()
}
