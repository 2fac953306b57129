//! Graph Model: the committed workflow graph and its validation rules.
//!
//! All mutation goes through [`WorkflowGraph`], which keeps the structural
//! invariants at all times: unique node ids, edges running from an existing
//! output port to an existing input port on a different node, and the
//! single-connection rule for non-`multi` inputs.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use crate::compat::are_types_compatible;
use crate::config::InputPolicy;
use crate::error::{ConnectError, GraphError};
use crate::geometry::Point;
use crate::model::{
    Edge, EdgeId, Endpoint, Node, NodeData, NodeId, NodeKind, Parameter, Port, PortDirection, PortKey,
    WorkflowDocument,
};
use crate::state::PortRegistry;

/// Parameter that carries a schema provider's output shape.
pub const SCHEMA_PARAMETER_ID: &str = "schema";

// ============================================================================
// Edge Validation Framework
// ============================================================================

/// Trait for edge validation logic.
///
/// `source` is always the output side and `target` the input side; direction
/// normalization happens before validators run. Compose several validators
/// with [`CompositeValidator`].
///
/// # Example
///
/// ```ignore
/// struct NoRouterChains;
///
/// impl EdgeValidator for NoRouterChains {
///     fn validate(&self, source: &PortKey, target: &PortKey, graph: &WorkflowGraph) -> Result<(), ConnectError> {
///         // Custom validation logic
///         Ok(())
///     }
/// }
/// ```
pub trait EdgeValidator {
    fn validate(&self, source: &PortKey, target: &PortKey, graph: &WorkflowGraph) -> Result<(), ConnectError>;
}

/// Structural rules: no self-loops, both ports must exist.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicEdgeValidator;

impl EdgeValidator for BasicEdgeValidator {
    fn validate(&self, source: &PortKey, target: &PortKey, graph: &WorkflowGraph) -> Result<(), ConnectError> {
        if source.node_id == target.node_id {
            return Err(ConnectError::SelfLoop);
        }
        if graph.port(source).is_none() {
            return Err(ConnectError::UnknownPort(source.clone()));
        }
        if graph.port(target).is_none() {
            return Err(ConnectError::UnknownPort(target.clone()));
        }
        Ok(())
    }
}

/// Rejects edges whose port types do not flow into each other.
#[derive(Clone, Copy, Debug, Default)]
pub struct TypeCompatibilityValidator;

impl EdgeValidator for TypeCompatibilityValidator {
    fn validate(&self, source: &PortKey, target: &PortKey, graph: &WorkflowGraph) -> Result<(), ConnectError> {
        let source_type = graph.port(source).and_then(|p| p.data_type.as_deref());
        let target_type = graph.port(target).and_then(|p| p.data_type.as_deref());

        if are_types_compatible(source_type, target_type) {
            Ok(())
        } else {
            Err(ConnectError::IncompatibleType {
                source_type: source_type.unwrap_or_default().to_string(),
                target_type: target_type.unwrap_or_default().to_string(),
            })
        }
    }
}

/// Validator that prevents duplicate edges
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDuplicatesValidator;

impl EdgeValidator for NoDuplicatesValidator {
    fn validate(&self, source: &PortKey, target: &PortKey, graph: &WorkflowGraph) -> Result<(), ConnectError> {
        let exists = graph
            .edges()
            .iter()
            .any(|e| &PortKey::from(&e.source) == source && &PortKey::from(&e.target) == target);
        if exists {
            Err(ConnectError::DuplicateEdge)
        } else {
            Ok(())
        }
    }
}

/// Enforces [`InputPolicy::Refuse`] for single-connection inputs.
///
/// Under [`InputPolicy::Replace`] this always passes; the graph removes the old
/// edge when the new one is committed.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleInputValidator {
    pub policy: InputPolicy,
}

impl EdgeValidator for SingleInputValidator {
    fn validate(&self, _source: &PortKey, target: &PortKey, graph: &WorkflowGraph) -> Result<(), ConnectError> {
        if self.policy == InputPolicy::Replace {
            return Ok(());
        }
        let multi = graph.port(target).is_some_and(|p| p.multi);
        if !multi && graph.incoming_edges(target).next().is_some() {
            return Err(ConnectError::InputAlreadyConnected(target.clone()));
        }
        Ok(())
    }
}

/// Composite validator that combines multiple validators
///
/// All validators must pass for the edge to be valid. The first error
/// encountered is returned.
///
/// # Example
///
/// ```ignore
/// let validator = CompositeValidator::new()
///     .add(BasicEdgeValidator)
///     .add(NoDuplicatesValidator);
/// ```
#[derive(Default)]
pub struct CompositeValidator {
    validators: Vec<Box<dyn EdgeValidator>>,
}

impl CompositeValidator {
    /// Create a new empty composite validator
    pub fn new() -> Self {
        Self::default()
    }

    /// The rules every workflow graph applies, in reporting order.
    pub fn standard(policy: InputPolicy) -> Self {
        Self::new()
            .add(BasicEdgeValidator)
            .add(TypeCompatibilityValidator)
            .add(NoDuplicatesValidator)
            .add(SingleInputValidator { policy })
    }

    /// Add a validator to the composite
    ///
    /// Validators are checked in the order they were added.
    pub fn add<V: EdgeValidator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl EdgeValidator for CompositeValidator {
    fn validate(&self, source: &PortKey, target: &PortKey, graph: &WorkflowGraph) -> Result<(), ConnectError> {
        for v in &self.validators {
            v.validate(source, target, graph)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for CompositeValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeValidator")
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// Order two ports as `(output, input)`.
///
/// Accepts either order so that edges can be drawn from an input back to an output.
pub fn normalize_edge_direction(a: &PortKey, b: &PortKey) -> Result<(PortKey, PortKey), ConnectError> {
    if a.node_id == b.node_id {
        return Err(ConnectError::SelfLoop);
    }
    match (a.direction, b.direction) {
        (PortDirection::Output, PortDirection::Input) => Ok((a.clone(), b.clone())),
        (PortDirection::Input, PortDirection::Output) => Ok((b.clone(), a.clone())),
        (direction, _) => Err(ConnectError::SameDirection(direction)),
    }
}

// ============================================================================
// Required Inputs / Schema Providers
// ============================================================================

/// Outcome of a required-input check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredInputCheck {
    Valid,
    /// First node (in graph order) with an unconnected required input
    Missing {
        node_id: NodeId,
        node_name: String,
        input_name: String,
    },
}

impl RequiredInputCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Report the first required input without an incoming edge.
///
/// Nodes are visited in order, and each node's inputs in declaration order.
pub fn validate_required_inputs(nodes: &[Node], edges: &[Edge]) -> RequiredInputCheck {
    let connected: HashSet<(&NodeId, &str)> = edges
        .iter()
        .map(|e| (&e.target.node_id, e.target.port_id.as_str()))
        .collect();

    for node in nodes {
        for input in node.data.inputs.iter().filter(|p| p.required) {
            if !connected.contains(&(&node.id, input.id.as_str())) {
                return RequiredInputCheck::Missing {
                    node_id: node.id.clone(),
                    node_name: node.data.node_name.clone(),
                    input_name: input.name.clone(),
                };
            }
        }
    }

    RequiredInputCheck::Valid
}

/// The schema provider feeding `target_port` on `target_node`, one hop upstream.
///
/// Only the first edge into the port is consulted, also on multi inputs.
pub fn connected_schema_provider<'a>(
    target_node: &NodeId,
    target_port: &str,
    edges: &[Edge],
    nodes: &'a [Node],
) -> Option<&'a Node> {
    let edge = edges
        .iter()
        .find(|e| &e.target.node_id == target_node && e.target.port_id == target_port)?;
    nodes
        .iter()
        .find(|n| n.id == edge.source.node_id)
        .filter(|n| n.kind == NodeKind::SchemaProvider)
}

// ============================================================================
// WorkflowGraph
// ============================================================================

/// The committed graph: nodes in insertion order plus edges.
#[derive(Debug)]
pub struct WorkflowGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    policy: InputPolicy,
    validator: CompositeValidator,
}

impl Default for WorkflowGraph {
    fn default() -> Self {
        Self::with_policy(InputPolicy::default())
    }
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: InputPolicy) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            policy,
            validator: CompositeValidator::standard(policy),
        }
    }

    /// Append an application-specific rule after the standard ones.
    pub fn add_validator<V: EdgeValidator + 'static>(&mut self, validator: V) {
        let validator_chain = std::mem::take(&mut self.validator);
        self.validator = validator_chain.add(validator);
    }

    pub fn policy(&self) -> InputPolicy {
        self.policy
    }

    // --- queries ---

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    /// Port definition behind a key, if the node and port exist.
    pub fn port(&self, key: &PortKey) -> Option<&Port> {
        self.node(&key.node_id)?.data.port(&key.port_id, key.direction)
    }

    /// Edges arriving at an input port.
    pub fn incoming_edges<'a>(&'a self, target: &'a PortKey) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.target.node_id == target.node_id && e.target.port_id == target.port_id)
    }

    /// Edges touching a node on either side.
    pub fn edges_of_node<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.touches(node_id))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // --- node mutation ---

    /// Add a node with a fresh unique id.
    pub fn add_node(&mut self, data: NodeData, position: Point) -> NodeId {
        let mut id = NodeId::generate();
        while self.contains_node(&id) {
            id = NodeId::generate();
        }
        debug!("add node {} ({})", id, data.node_name);
        self.nodes.push(Node::new(id.clone(), data, position));
        id
    }

    /// Insert a fully-formed node, keeping its id.
    pub fn insert_node(&mut self, mut node: Node) -> Result<(), GraphError> {
        if self.contains_node(&node.id) {
            return Err(GraphError::DuplicateNodeId(node.id));
        }
        node.kind = NodeKind::classify(&node.data);
        debug!("insert node {} ({})", node.id, node.data.node_name);
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let index = self.nodes.iter().position(|n| &n.id == id)?;
        let node = self.nodes.remove(index);

        let before = self.edges.len();
        self.edges.retain(|e| !e.touches(id));
        debug!("remove node {} and {} edge(s)", id, before - self.edges.len());

        Some(node)
    }

    pub fn set_node_position(&mut self, id: &NodeId, position: Point) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Move several nodes by the same world-space delta.
    pub fn translate_nodes<'a, I>(&mut self, ids: I, dx: f32, dy: f32)
    where
        I: IntoIterator<Item = &'a NodeId>,
    {
        for id in ids {
            if let Some(node) = self.node_mut(id) {
                node.position = node.position.offset(dx, dy);
            }
        }
    }

    pub fn set_expanded(&mut self, id: &NodeId, expanded: bool) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.is_expanded = expanded;
                true
            }
            None => false,
        }
    }

    /// Update a parameter value.
    ///
    /// Editing the schema of a schema provider pushes the new value to every
    /// directly connected downstream node.
    pub fn set_parameter_value(&mut self, id: &NodeId, parameter_id: &str, value: serde_json::Value) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let Some(parameter) = node.data.parameter_mut(parameter_id) else {
            return false;
        };
        parameter.value = value;

        if node.kind == NodeKind::SchemaProvider && parameter_id == SCHEMA_PARAMETER_ID {
            let targets: Vec<(NodeId, String)> = self
                .edges
                .iter()
                .filter(|e| &e.source.node_id == id)
                .map(|e| (e.target.node_id.clone(), e.target.port_id.clone()))
                .collect();
            for (node_id, port_id) in targets {
                self.propagate_schema(&node_id, &port_id);
            }
        }
        true
    }

    // --- edge mutation ---

    /// Dry run of [`add_edge`](Self::add_edge): returns the normalized
    /// `(output, input)` pair if the connection would be accepted.
    pub fn can_connect(&self, a: &PortKey, b: &PortKey) -> Result<(PortKey, PortKey), ConnectError> {
        let (source, target) = normalize_edge_direction(a, b)?;
        self.validator.validate(&source, &target, self)?;
        Ok((source, target))
    }

    /// Connect two ports, in either order.
    ///
    /// Under [`InputPolicy::Replace`] an existing edge into a single-connection
    /// input is removed first. A new edge coming out of a schema provider
    /// propagates its schema into the target node.
    pub fn add_edge(&mut self, a: &PortKey, b: &PortKey) -> Result<EdgeId, ConnectError> {
        let (source, target) = self.can_connect(a, b)?;

        let multi = self.port(&target).is_some_and(|p| p.multi);
        if !multi {
            let replaced: Vec<EdgeId> = self.incoming_edges(&target).map(|e| e.id.clone()).collect();
            for id in replaced {
                debug!("replace edge {} into {}", id, target);
                self.remove_edge(&id);
            }
        }

        let id = EdgeId::generate();
        debug!("add edge {}: {} -> {}", id, source, target);
        self.edges.push(Edge {
            id: id.clone(),
            source: Endpoint::from(source.clone()),
            target: Endpoint::from(target.clone()),
        });

        let from_provider = self
            .node(&source.node_id)
            .is_some_and(|n| n.kind == NodeKind::SchemaProvider);
        if from_provider {
            self.propagate_schema(&target.node_id, &target.port_id);
        }

        Ok(id)
    }

    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<Edge> {
        let index = self.edges.iter().position(|e| &e.id == id)?;
        debug!("remove edge {}", id);
        Some(self.edges.remove(index))
    }

    // --- validation / schema ---

    pub fn validate_required_inputs(&self) -> RequiredInputCheck {
        validate_required_inputs(&self.nodes, &self.edges)
    }

    pub fn connected_schema_provider(&self, target_node: &NodeId, target_port: &str) -> Option<&Node> {
        connected_schema_provider(target_node, target_port, &self.edges, &self.nodes)
    }

    /// Copy the schema of the provider feeding `target_port` into the target
    /// node's `schema` parameter, creating the parameter if needed.
    ///
    /// Returns `true` if the target changed.
    pub fn propagate_schema(&mut self, target_node: &NodeId, target_port: &str) -> bool {
        let schema = match self
            .connected_schema_provider(target_node, target_port)
            .and_then(|provider| provider.data.parameter(SCHEMA_PARAMETER_ID))
        {
            Some(parameter) => parameter.value.clone(),
            None => return false,
        };

        let Some(node) = self.node_mut(target_node) else {
            return false;
        };
        match node.data.parameter_mut(SCHEMA_PARAMETER_ID) {
            Some(parameter) if parameter.value == schema => false,
            Some(parameter) => {
                parameter.value = schema;
                debug!("schema propagated into {}", target_node);
                true
            }
            None => {
                node.data
                    .parameters
                    .push(Parameter::new(SCHEMA_PARAMETER_ID, "json", schema));
                debug!("schema propagated into {}", target_node);
                true
            }
        }
    }

    // --- pruning ---

    /// Drop edges whose endpoints no longer name an existing port.
    ///
    /// Returns the number of edges removed.
    pub fn prune_dangling_edges(&mut self) -> usize {
        let dangling: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|e| {
                e.source.node_id == e.target.node_id
                    || self.port(&PortKey::from(&e.source)).is_none()
                    || self.port(&PortKey::from(&e.target)).is_none()
            })
            .map(|e| e.id.clone())
            .collect();

        for id in &dangling {
            warn!("pruning dangling edge {}", id);
        }
        self.edges.retain(|e| !dangling.contains(&e.id));
        dangling.len()
    }

    /// Edges that repeat an earlier connection, or feed a single-connection
    /// input that an earlier edge already feeds. Edge order decides which one
    /// is first.
    fn conflicting_edges(&self) -> Vec<EdgeId> {
        let mut pairs: HashSet<(PortKey, PortKey)> = HashSet::new();
        let mut fed: HashSet<PortKey> = HashSet::new();
        let mut conflicting = Vec::new();

        for edge in &self.edges {
            let source = PortKey::from(&edge.source);
            let target = PortKey::from(&edge.target);
            let multi = self.port(&target).is_some_and(|p| p.multi);
            let repeated = !pairs.insert((source, target.clone()));
            let overloaded = !multi && !fed.insert(target);
            if repeated || overloaded {
                conflicting.push(edge.id.clone());
            }
        }
        conflicting
    }

    /// Drop duplicate connections and extra edges into single-connection inputs,
    /// keeping the first of each.
    ///
    /// Returns the number of edges removed.
    pub fn prune_conflicting_edges(&mut self) -> usize {
        let conflicting = self.conflicting_edges();
        for id in &conflicting {
            warn!("pruning conflicting edge {}", id);
        }
        self.edges.retain(|e| !conflicting.contains(&e.id));
        conflicting.len()
    }

    /// Drop edges that reference a port missing from the latest layout pass.
    pub fn prune_edges_not_in(&mut self, registry: &PortRegistry) -> usize {
        let before = self.edges.len();
        self.edges.retain(|e| {
            let keep = registry.contains(&PortKey::from(&e.source)) && registry.contains(&PortKey::from(&e.target));
            if !keep {
                warn!("pruning edge {}: port not rendered", e.id);
            }
            keep
        });
        before - self.edges.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    // --- documents ---

    /// Export the graph, checking every edge invariant on the way out.
    pub fn to_document(&self) -> Result<WorkflowDocument, GraphError> {
        for edge in &self.edges {
            if edge.source.port_type != PortDirection::Output || edge.target.port_type != PortDirection::Input {
                return Err(GraphError::InvalidEdgeDirection(edge.id.clone()));
            }
            if self.port(&PortKey::from(&edge.source)).is_none() || self.port(&PortKey::from(&edge.target)).is_none() {
                return Err(GraphError::DanglingEdge(edge.id.clone()));
            }
        }
        if let Some(id) = self.conflicting_edges().into_iter().next() {
            return Err(GraphError::ConflictingEdge(id));
        }
        info!("export {} node(s), {} edge(s)", self.nodes.len(), self.edges.len());
        Ok(WorkflowDocument {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        })
    }

    /// Build a graph from a document with the default input policy.
    pub fn from_document(doc: WorkflowDocument) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        graph.load_document(doc)?;
        Ok(graph)
    }

    /// Replace the contents of this graph with `doc`.
    ///
    /// Duplicate ids and misdirected edges are rejected. Edges that reference a
    /// missing port, loop back onto their own node, repeat a connection or feed
    /// an already-fed single-connection input are dropped with a warning.
    /// On error the graph is left unchanged.
    pub fn load_document(&mut self, doc: WorkflowDocument) -> Result<(), GraphError> {
        let mut staged = Self::with_policy(self.policy);

        for node in doc.nodes {
            staged.insert_node(node)?;
        }

        let mut edge_ids = HashSet::new();
        for edge in doc.edges {
            if !edge_ids.insert(edge.id.clone()) {
                return Err(GraphError::DuplicateEdgeId(edge.id));
            }
            if edge.source.port_type != PortDirection::Output || edge.target.port_type != PortDirection::Input {
                return Err(GraphError::InvalidEdgeDirection(edge.id));
            }
            staged.edges.push(edge);
        }
        staged.prune_dangling_edges();
        staged.prune_conflicting_edges();

        info!("import {} node(s), {} edge(s)", staged.nodes.len(), staged.edges.len());
        self.nodes = staged.nodes;
        self.edges = staged.edges;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(&self.to_document()?)?)
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let doc: WorkflowDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    // --- fragments ---

    /// The given nodes plus the edges running between them.
    pub fn fragment(&self, node_ids: &[NodeId]) -> WorkflowDocument {
        let wanted: HashSet<&NodeId> = node_ids.iter().collect();
        WorkflowDocument {
            nodes: self.nodes.iter().filter(|n| wanted.contains(&n.id)).cloned().collect(),
            edges: self
                .edges
                .iter()
                .filter(|e| wanted.contains(&e.source.node_id) && wanted.contains(&e.target.node_id))
                .cloned()
                .collect(),
        }
    }

    /// Paste a fragment: every node gets a fresh id and is shifted by `offset`,
    /// internal edges are re-created between the copies.
    ///
    /// Returns the ids of the new nodes in fragment order.
    pub fn insert_fragment(&mut self, fragment: &WorkflowDocument, offset: Point) -> Vec<NodeId> {
        let mut remap: HashMap<&NodeId, NodeId> = HashMap::new();
        let mut created = Vec::with_capacity(fragment.nodes.len());

        for node in &fragment.nodes {
            let new_id = self.add_node(node.data.clone(), node.position.add(offset));
            self.set_expanded(&new_id, node.is_expanded);
            remap.insert(&node.id, new_id.clone());
            created.push(new_id);
        }

        for edge in &fragment.edges {
            let (Some(source), Some(target)) = (remap.get(&edge.source.node_id), remap.get(&edge.target.node_id))
            else {
                continue;
            };
            let source = PortKey::output(source.clone(), edge.source.port_id.clone());
            let target = PortKey::input(target.clone(), edge.target.port_id.clone());
            if let Err(e) = self.add_edge(&source, &target) {
                warn!("skipping pasted edge {}: {}", edge.id, e);
            }
        }

        created
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn math() -> NodeData {
        NodeData::new("Math")
            .with_input(Port::new("a", "INT").required())
            .with_input(Port::new("b", "FLOAT"))
            .with_output(Port::new("sum", "INT"))
            .with_output(Port::new("ratio", "FLOAT"))
    }

    fn text() -> NodeData {
        NodeData::new("Text")
            .with_input(Port::new("in", "STRING"))
            .with_input(Port::new("any", "ANY"))
            .with_input(Port::new("many", "STRING").multi())
            .with_output(Port::new("out", "STRING"))
    }

    fn provider() -> NodeData {
        NodeData::new("JsonSchema")
            .with_output(Port::new("schema", "SCHEMA"))
            .with_parameter(Parameter::new(SCHEMA_PARAMETER_ID, "json", json!({ "type": "object" })))
    }

    fn consumer() -> NodeData {
        NodeData::new("StructuredLLM").with_input(Port::new("schema", "SCHEMA"))
    }

    /// Helper: graph with two Math nodes and two Text nodes
    fn setup_graph(policy: InputPolicy) -> (WorkflowGraph, NodeId, NodeId, NodeId, NodeId) {
        let mut graph = WorkflowGraph::with_policy(policy);
        let m1 = graph.add_node(math(), Point::new(0.0, 0.0));
        let m2 = graph.add_node(math(), Point::new(300.0, 0.0));
        let t1 = graph.add_node(text(), Point::new(0.0, 200.0));
        let t2 = graph.add_node(text(), Point::new(300.0, 200.0));
        (graph, m1, m2, t1, t2)
    }

    // ========================================================================
    // add_node() / remove_node()
    // ========================================================================

    #[test]
    fn test_add_node_ids_are_unique() {
        let mut graph = WorkflowGraph::new();
        let ids: HashSet<NodeId> = (0..50).map(|_| graph.add_node(math(), Point::ZERO)).collect();
        assert_eq!(ids.len(), 50);
        assert_eq!(graph.nodes().len(), 50);
    }

    #[test]
    fn test_add_node_resolves_kind() {
        let mut graph = WorkflowGraph::new();
        let p = graph.add_node(provider(), Point::ZERO);
        assert_eq!(graph.node(&p).map(|n| n.kind), Some(NodeKind::SchemaProvider));
    }

    #[test]
    fn test_insert_node_rejects_duplicate_id() {
        let mut graph = WorkflowGraph::new();
        let node = Node::new(NodeId::new("n1"), math(), Point::ZERO);
        graph.insert_node(node.clone()).unwrap();
        assert!(matches!(graph.insert_node(node), Err(GraphError::DuplicateNodeId(_))));
    }

    #[test]
    fn test_remove_node_cascades_edges() {
        // A -> B -> C, delete B
        let (mut graph, a, b, _, _) = setup_graph(InputPolicy::Replace);
        let c = graph.add_node(math(), Point::new(600.0, 0.0));
        graph.add_edge(&PortKey::output(a.clone(), "sum"), &PortKey::input(b.clone(), "a")).unwrap();
        graph.add_edge(&PortKey::output(b.clone(), "sum"), &PortKey::input(c, "a")).unwrap();

        let removed = graph.remove_node(&b).unwrap();
        assert_eq!(removed.id, b);
        assert!(graph.edges().is_empty());
        assert!(graph.remove_node(&b).is_none());
    }

    #[test]
    fn test_translate_nodes() {
        let (mut graph, a, b, t1, _) = setup_graph(InputPolicy::Replace);
        graph.translate_nodes([&a, &b], 10.0, -5.0);
        assert_eq!(graph.node(&a).unwrap().position, Point::new(10.0, -5.0));
        assert_eq!(graph.node(&b).unwrap().position, Point::new(310.0, -5.0));
        assert_eq!(graph.node(&t1).unwrap().position, Point::new(0.0, 200.0));
    }

    // ========================================================================
    // add_edge() - Validation
    // ========================================================================

    #[test]
    fn test_add_edge_normalizes_direction() {
        let (mut graph, a, b, _, _) = setup_graph(InputPolicy::Replace);
        let id = graph
            .add_edge(&PortKey::input(b.clone(), "a"), &PortKey::output(a.clone(), "sum"))
            .unwrap();
        let edge = graph.edge(&id).unwrap();
        assert_eq!(edge.source, Endpoint::output(a, "sum"));
        assert_eq!(edge.target, Endpoint::input(b, "a"));
    }

    #[test]
    fn test_add_edge_rejects_self_loop() {
        let (mut graph, a, _, _, _) = setup_graph(InputPolicy::Replace);
        let result = graph.add_edge(&PortKey::output(a.clone(), "sum"), &PortKey::input(a, "a"));
        assert_eq!(result, Err(ConnectError::SelfLoop));
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_add_edge_rejects_same_direction() {
        let (mut graph, a, b, _, _) = setup_graph(InputPolicy::Replace);
        let result = graph.add_edge(&PortKey::output(a, "sum"), &PortKey::output(b, "sum"));
        assert_eq!(result, Err(ConnectError::SameDirection(PortDirection::Output)));
    }

    #[test]
    fn test_add_edge_rejects_unknown_port() {
        let (mut graph, a, b, _, _) = setup_graph(InputPolicy::Replace);
        let target = PortKey::input(b, "missing");
        let result = graph.add_edge(&PortKey::output(a, "sum"), &target);
        assert_eq!(result, Err(ConnectError::UnknownPort(target)));
    }

    #[test]
    fn test_int_to_float_succeeds_float_to_int_fails() {
        let (mut graph, a, b, _, _) = setup_graph(InputPolicy::Replace);
        assert!(graph
            .add_edge(&PortKey::output(a.clone(), "sum"), &PortKey::input(b.clone(), "b"))
            .is_ok());
        assert_eq!(
            graph.add_edge(&PortKey::output(a, "ratio"), &PortKey::input(b, "a")),
            Err(ConnectError::IncompatibleType {
                source_type: "FLOAT".into(),
                target_type: "INT".into(),
            })
        );
    }

    #[test]
    fn test_any_input_accepts_every_type() {
        let (mut graph, a, _, _, t2) = setup_graph(InputPolicy::Replace);
        assert!(graph.add_edge(&PortKey::output(a, "ratio"), &PortKey::input(t2, "any")).is_ok());
    }

    #[test]
    fn test_add_edge_rejects_duplicate() {
        let (mut graph, _, _, t1, t2) = setup_graph(InputPolicy::Replace);
        let source = PortKey::output(t1, "out");
        let target = PortKey::input(t2, "many");
        graph.add_edge(&source, &target).unwrap();
        assert_eq!(graph.add_edge(&source, &target), Err(ConnectError::DuplicateEdge));
    }

    // ========================================================================
    // add_edge() - Single-Connection Inputs
    // ========================================================================

    #[test]
    fn test_replace_policy_swaps_existing_edge() {
        let (mut graph, a, b, _, _) = setup_graph(InputPolicy::Replace);
        let c = graph.add_node(math(), Point::ZERO);
        let target = PortKey::input(b, "a");
        let first = graph.add_edge(&PortKey::output(a, "sum"), &target).unwrap();
        let second = graph.add_edge(&PortKey::output(c.clone(), "sum"), &target).unwrap();

        assert!(graph.edge(&first).is_none());
        assert_eq!(graph.incoming_edges(&target).count(), 1);
        assert_eq!(graph.edge(&second).unwrap().source.node_id, c);
    }

    #[test]
    fn test_refuse_policy_rejects_second_edge() {
        let (mut graph, a, b, _, _) = setup_graph(InputPolicy::Refuse);
        let c = graph.add_node(math(), Point::ZERO);
        let target = PortKey::input(b, "a");
        graph.add_edge(&PortKey::output(a, "sum"), &target).unwrap();

        assert_eq!(
            graph.add_edge(&PortKey::output(c, "sum"), &target),
            Err(ConnectError::InputAlreadyConnected(target.clone()))
        );
        assert_eq!(graph.incoming_edges(&target).count(), 1);
    }

    #[test]
    fn test_multi_input_accepts_many_edges() {
        let (mut graph, _, _, t1, t2) = setup_graph(InputPolicy::Refuse);
        let t3 = graph.add_node(text(), Point::ZERO);
        let target = PortKey::input(t2, "many");
        graph.add_edge(&PortKey::output(t1, "out"), &target).unwrap();
        graph.add_edge(&PortKey::output(t3, "out"), &target).unwrap();
        assert_eq!(graph.incoming_edges(&target).count(), 2);
    }

    #[test]
    fn test_can_connect_is_side_effect_free() {
        let (graph, a, b, _, _) = setup_graph(InputPolicy::Replace);
        let result = graph.can_connect(&PortKey::input(b.clone(), "a"), &PortKey::output(a.clone(), "sum"));
        assert_eq!(result, Ok((PortKey::output(a, "sum"), PortKey::input(b, "a"))));
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_custom_validator_runs_after_standard_rules() {
        struct NoTextTargets;
        impl EdgeValidator for NoTextTargets {
            fn validate(&self, _s: &PortKey, t: &PortKey, g: &WorkflowGraph) -> Result<(), ConnectError> {
                match g.node(&t.node_id) {
                    Some(n) if n.data.node_name == "Text" => Err(ConnectError::UnknownPort(t.clone())),
                    _ => Ok(()),
                }
            }
        }

        let (mut graph, a, _, _, t2) = setup_graph(InputPolicy::Replace);
        graph.add_validator(NoTextTargets);
        assert!(graph.add_edge(&PortKey::output(a, "sum"), &PortKey::input(t2, "any")).is_err());
    }

    #[test]
    fn test_remove_edge() {
        let (mut graph, a, b, _, _) = setup_graph(InputPolicy::Replace);
        let id = graph.add_edge(&PortKey::output(a, "sum"), &PortKey::input(b, "a")).unwrap();
        assert!(graph.remove_edge(&id).is_some());
        assert!(graph.remove_edge(&id).is_none());
        assert!(graph.edges().is_empty());
    }

    // ========================================================================
    // validate_required_inputs()
    // ========================================================================

    #[test]
    fn test_required_input_reports_first_failure() {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_node(
            NodeData::new("A")
                .with_input(Port::new("x", "STRING").required())
                .with_input(Port::new("y", "STRING").required()),
            Point::ZERO,
        );
        graph.add_node(NodeData::new("B").with_input(Port::new("z", "STRING").required()), Point::ZERO);

        assert_eq!(
            graph.validate_required_inputs(),
            RequiredInputCheck::Missing {
                node_id: a,
                node_name: "A".into(),
                input_name: "x".into(),
            }
        );
    }

    #[test]
    fn test_required_input_satisfied() {
        let (mut graph, a, b, _, _) = setup_graph(InputPolicy::Replace);
        let c = graph.add_node(math(), Point::ZERO);
        graph.add_edge(&PortKey::output(c.clone(), "sum"), &PortKey::input(a.clone(), "a")).unwrap();
        graph.add_edge(&PortKey::output(c.clone(), "sum"), &PortKey::input(b, "a")).unwrap();

        // The third Math node still has its own required input open
        assert!(matches!(
            graph.validate_required_inputs(),
            RequiredInputCheck::Missing { ref node_id, .. } if node_id == &c
        ));

        graph.add_edge(&PortKey::output(a, "sum"), &PortKey::input(c, "a")).unwrap();
        assert!(graph.validate_required_inputs().is_valid());
    }

    #[test]
    fn test_required_inputs_empty_graph_valid() {
        assert!(validate_required_inputs(&[], &[]).is_valid());
    }

    // ========================================================================
    // Schema Providers
    // ========================================================================

    #[test]
    fn test_connected_schema_provider_one_hop() {
        let mut graph = WorkflowGraph::new();
        let p = graph.add_node(provider(), Point::ZERO);
        let c = graph.add_node(consumer(), Point::ZERO);
        graph.add_edge(&PortKey::output(p.clone(), "schema"), &PortKey::input(c.clone(), "schema")).unwrap();

        assert_eq!(graph.connected_schema_provider(&c, "schema").map(|n| &n.id), Some(&p));
        assert!(graph.connected_schema_provider(&p, "schema").is_none());
    }

    #[test]
    fn test_schema_provider_lookup_uses_first_edge_only() {
        let nodes = vec![
            Node::new(NodeId::new("plain"), text(), Point::ZERO),
            Node::new(NodeId::new("p"), provider(), Point::ZERO),
            Node::new(NodeId::new("c"), text(), Point::ZERO),
        ];
        let edges = vec![
            Edge {
                id: EdgeId::new("e1"),
                source: Endpoint::output("plain", "out"),
                target: Endpoint::input("c", "many"),
            },
            Edge {
                id: EdgeId::new("e2"),
                source: Endpoint::output("p", "schema"),
                target: Endpoint::input("c", "many"),
            },
        ];

        assert!(connected_schema_provider(&NodeId::new("c"), "many", &edges, &nodes).is_none());
        assert_eq!(
            connected_schema_provider(&NodeId::new("c"), "many", &edges[1..], &nodes).map(|n| n.id.as_str()),
            Some("p")
        );
    }

    #[test]
    fn test_connect_from_provider_propagates_schema() {
        let mut graph = WorkflowGraph::new();
        let p = graph.add_node(provider(), Point::ZERO);
        let c = graph.add_node(consumer(), Point::ZERO);
        graph.add_edge(&PortKey::output(p, "schema"), &PortKey::input(c.clone(), "schema")).unwrap();

        let schema = graph.node(&c).and_then(|n| n.data.parameter(SCHEMA_PARAMETER_ID)).unwrap();
        assert_eq!(schema.value, json!({ "type": "object" }));
    }

    #[test]
    fn test_editing_provider_schema_updates_downstream() {
        let mut graph = WorkflowGraph::new();
        let p = graph.add_node(provider(), Point::ZERO);
        let c = graph.add_node(consumer(), Point::ZERO);
        graph.add_edge(&PortKey::output(p.clone(), "schema"), &PortKey::input(c.clone(), "schema")).unwrap();

        let updated = json!({ "type": "array" });
        assert!(graph.set_parameter_value(&p, SCHEMA_PARAMETER_ID, updated.clone()));
        let schema = graph.node(&c).and_then(|n| n.data.parameter(SCHEMA_PARAMETER_ID)).unwrap();
        assert_eq!(schema.value, updated);
    }

    #[test]
    fn test_propagate_without_provider_is_noop() {
        let (mut graph, _, b, _, _) = setup_graph(InputPolicy::Replace);
        assert!(!graph.propagate_schema(&b, "a"));
    }

    // ========================================================================
    // Pruning
    // ========================================================================

    #[test]
    fn test_prune_edges_not_in_registry() {
        use crate::config::NodeMetrics;
        use crate::geometry::{Rect, Viewport};

        let (mut graph, a, b, _, _) = setup_graph(InputPolicy::Replace);
        graph.add_edge(&PortKey::output(a, "sum"), &PortKey::input(b.clone(), "a")).unwrap();

        let mut registry = PortRegistry::new();
        registry.sync_nodes(graph.nodes(), &NodeMetrics::default());
        registry.rebuild(&Rect::default(), &Viewport::default());
        assert_eq!(graph.prune_edges_not_in(&registry), 0);

        registry.remove_node(&b);
        assert_eq!(graph.prune_edges_not_in(&registry), 1);
        assert!(graph.edges().is_empty());
    }

    // ========================================================================
    // Documents
    // ========================================================================

    #[test]
    fn test_document_round_trip_is_isomorphic() {
        let (mut graph, a, b, t1, t2) = setup_graph(InputPolicy::Replace);
        graph.add_edge(&PortKey::output(a, "sum"), &PortKey::input(b.clone(), "a")).unwrap();
        graph.add_edge(&PortKey::output(t1, "out"), &PortKey::input(t2, "many")).unwrap();
        graph.set_expanded(&b, false);

        let json = graph.to_json().unwrap();
        let restored = WorkflowGraph::from_json(&json).unwrap();

        assert_eq!(restored.nodes(), graph.nodes());
        assert_eq!(restored.edges(), graph.edges());
    }

    #[test]
    fn test_import_reclassifies_kind() {
        let json = r#"{
            "nodes": [{ "id": "p", "position": { "x": 0, "y": 0 }, "data": { "nodeName": "JsonSchema" } }],
            "edges": []
        }"#;
        let graph = WorkflowGraph::from_json(json).unwrap();
        let node = graph.node(&NodeId::new("p")).unwrap();
        assert_eq!(node.kind, NodeKind::SchemaProvider);
        assert!(node.is_expanded);
    }

    #[test]
    fn test_import_rejects_duplicate_node_ids() {
        let doc = WorkflowDocument {
            nodes: vec![
                Node::new(NodeId::new("n"), math(), Point::ZERO),
                Node::new(NodeId::new("n"), math(), Point::ZERO),
            ],
            edges: vec![],
        };
        assert!(matches!(WorkflowGraph::from_document(doc), Err(GraphError::DuplicateNodeId(_))));
    }

    #[test]
    fn test_import_rejects_misdirected_edge() {
        let doc = WorkflowDocument {
            nodes: vec![
                Node::new(NodeId::new("a"), math(), Point::ZERO),
                Node::new(NodeId::new("b"), math(), Point::ZERO),
            ],
            edges: vec![Edge {
                id: EdgeId::new("e"),
                source: Endpoint::input("a", "a"),
                target: Endpoint::output("b", "sum"),
            }],
        };
        assert!(matches!(
            WorkflowGraph::from_document(doc),
            Err(GraphError::InvalidEdgeDirection(_))
        ));
    }

    #[test]
    fn test_import_prunes_dangling_edges() {
        let doc = WorkflowDocument {
            nodes: vec![Node::new(NodeId::new("a"), math(), Point::ZERO)],
            edges: vec![Edge {
                id: EdgeId::new("e"),
                source: Endpoint::output("a", "sum"),
                target: Endpoint::input("ghost", "a"),
            }],
        };
        let graph = WorkflowGraph::from_document(doc).unwrap();
        assert_eq!(graph.nodes().len(), 1);
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_import_keeps_one_edge_per_single_input() {
        let doc = WorkflowDocument {
            nodes: vec![
                Node::new(NodeId::new("a"), text(), Point::ZERO),
                Node::new(NodeId::new("b"), text(), Point::ZERO),
                Node::new(NodeId::new("c"), text(), Point::ZERO),
            ],
            edges: vec![
                Edge {
                    id: EdgeId::new("e1"),
                    source: Endpoint::output("a", "out"),
                    target: Endpoint::input("c", "in"),
                },
                Edge {
                    id: EdgeId::new("e2"),
                    source: Endpoint::output("b", "out"),
                    target: Endpoint::input("c", "in"),
                },
                Edge {
                    id: EdgeId::new("e3"),
                    source: Endpoint::output("b", "out"),
                    target: Endpoint::input("c", "in"),
                },
            ],
        };

        let graph = WorkflowGraph::from_document(doc).unwrap();

        let c_in = PortKey::input("c", "in");
        let incoming: Vec<_> = graph.incoming_edges(&c_in).collect();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].id, EdgeId::new("e1"));
        assert_eq!(graph.to_document().unwrap().edges.len(), 1);
    }

    #[test]
    fn test_import_drops_repeated_connection_into_multi_input() {
        let edge = |id: &str| Edge {
            id: EdgeId::new(id),
            source: Endpoint::output("a", "out"),
            target: Endpoint::input("b", "many"),
        };
        let doc = WorkflowDocument {
            nodes: vec![
                Node::new(NodeId::new("a"), text(), Point::ZERO),
                Node::new(NodeId::new("b"), text(), Point::ZERO),
            ],
            edges: vec![edge("e1"), edge("e2")],
        };

        let graph = WorkflowGraph::from_document(doc).unwrap();
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_export_rejects_overloaded_input() {
        let (mut graph, _, _, t1, t2) = setup_graph(InputPolicy::Replace);
        let t3 = graph.add_node(text(), Point::ZERO);
        graph
            .add_edge(&PortKey::output(t1.clone(), "out"), &PortKey::input(t2.clone(), "in"))
            .unwrap();
        graph.edges.push(Edge {
            id: EdgeId::new("extra"),
            source: Endpoint::output(t3, "out"),
            target: Endpoint::input(t2, "in"),
        });

        assert!(matches!(
            graph.to_document(),
            Err(GraphError::ConflictingEdge(id)) if id == EdgeId::new("extra")
        ));
    }

    #[test]
    fn test_failed_load_leaves_graph_unchanged() {
        let (mut graph, _, _, _, _) = setup_graph(InputPolicy::Replace);
        let doc = WorkflowDocument {
            nodes: vec![
                Node::new(NodeId::new("n"), math(), Point::ZERO),
                Node::new(NodeId::new("n"), math(), Point::ZERO),
            ],
            edges: vec![],
        };
        assert!(graph.load_document(doc).is_err());
        assert_eq!(graph.nodes().len(), 4);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(WorkflowGraph::from_json("not json"), Err(GraphError::Json(_))));
    }

    // ========================================================================
    // Fragments
    // ========================================================================

    #[test]
    fn test_fragment_keeps_only_internal_edges() {
        let (mut graph, a, b, _, _) = setup_graph(InputPolicy::Replace);
        let c = graph.add_node(math(), Point::ZERO);
        graph.add_edge(&PortKey::output(a.clone(), "sum"), &PortKey::input(b.clone(), "a")).unwrap();
        graph.add_edge(&PortKey::output(b.clone(), "sum"), &PortKey::input(c, "a")).unwrap();

        let fragment = graph.fragment(&[a, b]);
        assert_eq!(fragment.nodes.len(), 2);
        assert_eq!(fragment.edges.len(), 1);
    }

    #[test]
    fn test_insert_fragment_remaps_ids() {
        let (mut graph, a, b, _, _) = setup_graph(InputPolicy::Replace);
        graph.add_edge(&PortKey::output(a.clone(), "sum"), &PortKey::input(b.clone(), "a")).unwrap();

        let fragment = graph.fragment(&[a.clone(), b.clone()]);
        let created = graph.insert_fragment(&fragment, Point::new(20.0, 20.0));

        assert_eq!(created.len(), 2);
        assert!(!created.contains(&a) && !created.contains(&b));
        assert_eq!(graph.nodes().len(), 6);
        assert_eq!(graph.edges().len(), 2);
        assert_eq!(graph.node(&created[0]).unwrap().position, Point::new(20.0, 20.0));
        assert_eq!(graph.edges_of_node(&created[1]).count(), 1);
    }
}
