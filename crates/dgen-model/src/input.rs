//! Raw design extraction payload
//!
//! [`RawInput`] is what the design-tool plugin hands over for one request: the
//! selected node tree, the styles it references, selection metadata and an
//! optional screenshot reference. The core treats it as already validated and
//! never mutates it.

use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Design extraction for a single request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInput {
    /// Source file identifier in the design tool
    pub file_id: String,
    /// Selection metadata
    #[serde(default)]
    pub selection: Selection,
    /// Selected node trees (one per selected root)
    #[serde(default)]
    pub nodes: Vec<DesignNode>,
    /// Styles referenced by the nodes
    #[serde(default)]
    pub styles: Vec<StyleDefinition>,
    /// Optional screenshot of the selection
    #[serde(default)]
    pub screenshot: Option<ScreenshotRef>,
    /// Free-form description typed by the user in the plugin
    #[serde(default)]
    pub description: Option<String>,
    /// Capture timestamp (not part of the fingerprint)
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
}

/// Selection metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Page name the selection lives on
    #[serde(default)]
    pub page: Option<String>,
    /// Ids of the selected root nodes
    #[serde(default)]
    pub node_ids: Vec<String>,
}

/// A node in the design tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignNode {
    /// Node id
    pub id: String,
    /// Layer name
    #[serde(default)]
    pub name: String,
    /// Node type
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    /// Absolute bounding box
    #[serde(default)]
    pub geometry: Option<Geometry>,
    /// Ids of styles applied to this node
    #[serde(default)]
    pub style_refs: Vec<String>,
    /// Text content (text nodes only)
    #[serde(default)]
    pub text: Option<String>,
    /// Prototype interactions
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    /// Variant property values (component sets / instances)
    #[serde(default)]
    pub variants: Vec<String>,
    /// Child nodes
    #[serde(default)]
    pub children: Vec<DesignNode>,
}

impl DesignNode {
    /// Create a leaf node
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type,
            geometry: None,
            style_refs: Vec::new(),
            text: None,
            interactions: Vec::new(),
            variants: Vec::new(),
            children: Vec::new(),
        }
    }

    /// With children
    #[must_use]
    pub fn with_children(mut self, children: Vec<DesignNode>) -> Self {
        self.children = children;
        self
    }

    /// With text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// With a prototype interaction
    #[must_use]
    pub fn with_interaction(mut self, trigger: impl Into<String>, action: impl Into<String>) -> Self {
        self.interactions.push(Interaction {
            trigger: trigger.into(),
            action: action.into(),
        });
        self
    }

    /// With variant values
    #[must_use]
    pub fn with_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variants = variants.into_iter().map(Into::into).collect();
        self
    }

    /// With style references
    #[must_use]
    pub fn with_styles<I, S>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.style_refs = styles.into_iter().map(Into::into).collect();
        self
    }
}

/// Design node type
///
/// Unknown tool-specific types are preserved in [`NodeType::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    /// Top-level or nested frame
    #[default]
    Frame,
    /// Group of layers
    Group,
    /// Component definition
    Component,
    /// Set of component variants
    ComponentSet,
    /// Component instance
    Instance,
    /// Text layer
    Text,
    /// Rectangle shape
    Rectangle,
    /// Ellipse shape
    Ellipse,
    /// Vector path
    Vector,
    /// Any other node type
    Other(String),
}

impl NodeType {
    /// Canonical wire name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Frame => "FRAME",
            Self::Group => "GROUP",
            Self::Component => "COMPONENT",
            Self::ComponentSet => "COMPONENT_SET",
            Self::Instance => "INSTANCE",
            Self::Text => "TEXT",
            Self::Rectangle => "RECTANGLE",
            Self::Ellipse => "ELLIPSE",
            Self::Vector => "VECTOR",
            Self::Other(name) => name,
        }
    }

    /// Whether this node is a component, component set or instance
    #[inline]
    #[must_use]
    pub fn is_component_like(&self) -> bool {
        matches!(self, Self::Component | Self::ComponentSet | Self::Instance)
    }
}

impl From<String> for NodeType {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "FRAME" => Self::Frame,
            "GROUP" => Self::Group,
            "COMPONENT" => Self::Component,
            "COMPONENT_SET" => Self::ComponentSet,
            "INSTANCE" => Self::Instance,
            "TEXT" => Self::Text,
            "RECTANGLE" => Self::Rectangle,
            "ELLIPSE" => Self::Ellipse,
            "VECTOR" => Self::Vector,
            _ => Self::Other(value),
        }
    }
}

impl From<NodeType> for String {
    fn from(value: NodeType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Absolute bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Prototype interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// Trigger type (e.g. `ON_CLICK`, `ON_HOVER`)
    pub trigger: String,
    /// Action type (e.g. `NAVIGATE`, `OPEN_OVERLAY`)
    #[serde(default)]
    pub action: String,
}

/// Style definition referenced by nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDefinition {
    /// Style id
    pub id: String,
    /// Style name (e.g. `Brand/Primary`)
    pub name: String,
    /// Style kind
    #[serde(rename = "type")]
    pub kind: StyleKind,
    /// Resolved value (hex colour, font shorthand, ...)
    #[serde(default)]
    pub value: Option<String>,
}

impl StyleDefinition {
    /// Create a style without a resolved value
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: StyleKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            value: None,
        }
    }

    /// With resolved value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Style kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StyleKind {
    Fill,
    Text,
    Effect,
    Grid,
}

/// Screenshot reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotRef {
    /// Where the image can be fetched (may be a short-lived signed URL)
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Source file identifier the screenshot was taken from
    #[serde(default)]
    pub file_id: Option<String>,
}

impl RawInput {
    /// Create an input with no nodes
    #[must_use]
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            selection: Selection::default(),
            nodes: Vec::new(),
            styles: Vec::new(),
            screenshot: None,
            description: None,
            captured_at: None,
        }
    }

    /// With root nodes
    #[must_use]
    pub fn with_nodes(mut self, nodes: Vec<DesignNode>) -> Self {
        self.selection.node_ids = nodes.iter().map(|n| n.id.clone()).collect();
        self.nodes = nodes;
        self
    }

    /// With styles
    #[must_use]
    pub fn with_styles(mut self, styles: Vec<StyleDefinition>) -> Self {
        self.styles = styles;
        self
    }

    /// With user description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With page name
    #[must_use]
    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.selection.page = Some(page.into());
        self
    }

    /// Deterministic fingerprint of the semantically relevant fields
    ///
    /// Excludes the capture timestamp and the screenshot URL, which change
    /// between captures of the same selection.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = blake3::Hasher::new();
        write_field(&mut hasher, self.file_id.as_bytes());
        write_opt(&mut hasher, self.selection.page.as_deref());
        write_len(&mut hasher, self.selection.node_ids.len());
        for id in &self.selection.node_ids {
            write_field(&mut hasher, id.as_bytes());
        }
        write_len(&mut hasher, self.nodes.len());
        for node in &self.nodes {
            hash_node(&mut hasher, node);
        }
        write_len(&mut hasher, self.styles.len());
        for style in &self.styles {
            write_field(&mut hasher, style.id.as_bytes());
            write_field(&mut hasher, style.name.as_bytes());
            write_field(&mut hasher, format!("{:?}", style.kind).as_bytes());
            write_opt(&mut hasher, style.value.as_deref());
        }
        write_opt(&mut hasher, self.description.as_deref());
        write_opt(
            &mut hasher,
            self.screenshot.as_ref().and_then(|s| s.file_id.as_deref()),
        );
        Fingerprint::new(*hasher.finalize().as_bytes())
    }

    /// Depth-first walk over every node, yielding `(depth, node)` with roots at depth 1
    #[must_use]
    pub fn walk(&self) -> NodeWalk<'_> {
        NodeWalk {
            stack: self.nodes.iter().rev().map(|n| (1, n)).collect(),
        }
    }

    /// Total node count across all roots
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    /// Maximum nesting depth (0 for an empty selection)
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.walk().map(|(depth, _)| depth).max().unwrap_or(0)
    }

    /// Distinct interaction trigger types, sorted
    #[must_use]
    pub fn interaction_types(&self) -> BTreeSet<String> {
        self.walk()
            .flat_map(|(_, n)| n.interactions.iter().map(|i| i.trigger.clone()))
            .collect()
    }

    /// Total variant count across component sets and instances
    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.walk().map(|(_, n)| n.variants.len()).sum()
    }

    /// Distinct component-like node names, sorted
    #[must_use]
    pub fn component_names(&self) -> BTreeSet<String> {
        self.walk()
            .filter(|(_, n)| n.node_type.is_component_like() && !n.name.is_empty())
            .map(|(_, n)| n.name.clone())
            .collect()
    }

    /// Text content in document order
    #[must_use]
    pub fn text_content(&self) -> Vec<&str> {
        self.walk()
            .filter_map(|(_, n)| n.text.as_deref())
            .filter(|t| !t.trim().is_empty())
            .collect()
    }

    /// Human title for the selection: first named root, else the file id
    #[must_use]
    pub fn title(&self) -> String {
        self.nodes
            .iter()
            .map(|n| n.name.trim())
            .find(|name| !name.is_empty())
            .map_or_else(|| self.file_id.clone(), str::to_string)
    }
}

/// Depth-first iterator over a design tree
#[derive(Debug)]
pub struct NodeWalk<'a> {
    stack: Vec<(usize, &'a DesignNode)>,
}

impl<'a> Iterator for NodeWalk<'a> {
    type Item = (usize, &'a DesignNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        Some((depth, node))
    }
}

fn hash_node(hasher: &mut blake3::Hasher, node: &DesignNode) {
    write_field(hasher, node.id.as_bytes());
    write_field(hasher, node.name.as_bytes());
    write_field(hasher, node.node_type.as_str().as_bytes());
    match &node.geometry {
        Some(g) => {
            hasher.update(&[1]);
            for v in [g.x, g.y, g.width, g.height] {
                hasher.update(&v.to_le_bytes());
            }
        }
        None => {
            hasher.update(&[0]);
        }
    }
    write_len(hasher, node.style_refs.len());
    for s in &node.style_refs {
        write_field(hasher, s.as_bytes());
    }
    write_opt(hasher, node.text.as_deref());
    write_len(hasher, node.interactions.len());
    for i in &node.interactions {
        write_field(hasher, i.trigger.as_bytes());
        write_field(hasher, i.action.as_bytes());
    }
    write_len(hasher, node.variants.len());
    for v in &node.variants {
        write_field(hasher, v.as_bytes());
    }
    write_len(hasher, node.children.len());
    for child in &node.children {
        hash_node(hasher, child);
    }
}

// Length-prefixed so adjacent fields can never alias.
fn write_field(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    write_len(hasher, bytes.len());
    hasher.update(bytes);
}

fn write_len(hasher: &mut blake3::Hasher, len: usize) {
    hasher.update(&(len as u64).to_le_bytes());
}

fn write_opt(hasher: &mut blake3::Hasher, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update(&[1]);
            write_field(hasher, v.as_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
}
