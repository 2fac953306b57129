//! Workflow data model: nodes, ports, parameters, edges and the serialized
//! document handed to persistence/execution collaborators.
//!
//! Field names serialize in camelCase so documents stay compatible with the
//! JSON shape used by the surrounding application (`nodeName`, `isExpanded`,
//! `portType`, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Unique, immutable node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique edge identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Structured identity of a rendered port: `(node, port, direction)`.
///
/// Ordered field by field, which gives port maps a deterministic iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortKey {
    pub node_id: NodeId,
    pub port_id: String,
    pub direction: PortDirection,
}

impl PortKey {
    pub fn new(node_id: impl Into<NodeId>, port_id: impl Into<String>, direction: PortDirection) -> Self {
        Self {
            node_id: node_id.into(),
            port_id: port_id.into(),
            direction,
        }
    }

    pub fn input(node_id: impl Into<NodeId>, port_id: impl Into<String>) -> Self {
        Self::new(node_id, port_id, PortDirection::Input)
    }

    pub fn output(node_id: impl Into<NodeId>, port_id: impl Into<String>) -> Self {
        Self::new(node_id, port_id, PortDirection::Output)
    }
}

impl From<&Endpoint> for PortKey {
    fn from(e: &Endpoint) -> Self {
        Self::new(e.node_id.clone(), e.port_id.clone(), e.port_type)
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}({})", self.node_id, self.port_id, self.direction)
    }
}

/// A typed connection point on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub name: String,
    /// Data type name; `None` means untyped (connects to anything).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multi: bool,
}

impl Port {
    pub fn new(id: impl Into<String>, data_type: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            data_type: Some(data_type.into()),
            required: false,
            multi: false,
        }
    }

    pub fn untyped(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            data_type: None,
            required: false,
            multi: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }
}

/// Editable node parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Parameter {
    pub fn new(id: impl Into<String>, param_type: impl Into<String>, value: serde_json::Value) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            value,
            param_type: param_type.into(),
            options: None,
        }
    }
}

/// Template data carried by every node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub node_name: String,
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl NodeData {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            ..Default::default()
        }
    }

    pub fn with_input(mut self, port: Port) -> Self {
        self.inputs.push(port);
        self
    }

    pub fn with_output(mut self, port: Port) -> Self {
        self.outputs.push(port);
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn input(&self, port_id: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.id == port_id)
    }

    pub fn output(&self, port_id: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.id == port_id)
    }

    pub fn port(&self, port_id: &str, direction: PortDirection) -> Option<&Port> {
        match direction {
            PortDirection::Input => self.input(port_id),
            PortDirection::Output => self.output(port_id),
        }
    }

    pub fn parameter(&self, id: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.id == id)
    }

    pub fn parameter_mut(&mut self, id: &str) -> Option<&mut Parameter> {
        self.parameters.iter_mut().find(|p| p.id == id)
    }
}

/// Node names whose output shape downstream nodes may mirror.
pub const SCHEMA_PROVIDER_NODE_NAMES: &[&str] = &["SchemaProvider", "JsonSchema", "StructuredOutputSchema"];

/// Node names rendered as routers.
pub const ROUTER_NODE_NAMES: &[&str] = &["Router", "ConditionalRouter"];

/// Whether `data` describes one of the well-known schema provider node types.
pub fn is_schema_provider_node(data: &NodeData) -> bool {
    SCHEMA_PROVIDER_NODE_NAMES.contains(&data.node_name.as_str())
}

/// Closed set of node kinds, resolved once when a node is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    #[default]
    Standard,
    SchemaProvider,
    Router,
}

impl NodeKind {
    pub fn classify(data: &NodeData) -> Self {
        if is_schema_provider_node(data) {
            Self::SchemaProvider
        } else if ROUTER_NODE_NAMES.contains(&data.node_name.as_str()) {
            Self::Router
        } else {
            Self::Standard
        }
    }
}

/// A committed node in the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub position: Point,
    pub data: NodeData,
    #[serde(default = "default_expanded")]
    pub is_expanded: bool,
    #[serde(skip)]
    pub kind: NodeKind,
}

fn default_expanded() -> bool {
    true
}

impl Node {
    pub fn new(id: NodeId, data: NodeData, position: Point) -> Self {
        let kind = NodeKind::classify(&data);
        Self {
            id,
            position,
            data,
            is_expanded: true,
            kind,
        }
    }

    pub fn port_key(&self, port_id: &str, direction: PortDirection) -> PortKey {
        PortKey::new(self.id.clone(), port_id, direction)
    }
}

/// One end of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub node_id: NodeId,
    pub port_id: String,
    pub port_type: PortDirection,
}

impl Endpoint {
    pub fn output(node_id: impl Into<NodeId>, port_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            port_id: port_id.into(),
            port_type: PortDirection::Output,
        }
    }

    pub fn input(node_id: impl Into<NodeId>, port_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            port_id: port_id.into(),
            port_type: PortDirection::Input,
        }
    }
}

impl From<PortKey> for Endpoint {
    fn from(key: PortKey) -> Self {
        Self {
            node_id: key.node_id,
            port_id: key.port_id,
            port_type: key.direction,
        }
    }
}

/// A committed connection from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: Endpoint,
    pub target: Endpoint,
}

impl Edge {
    pub fn touches(&self, node_id: &NodeId) -> bool {
        &self.source.node_id == node_id || &self.target.node_id == node_id
    }
}

/// Serializable workflow handed to persistence/execution collaborators.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}
