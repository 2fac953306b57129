//! Predicted nodes: suggestions shown on the canvas that are not part of the
//! committed graph until the user clicks them.

use log::debug;

use crate::geometry::Point;
use crate::graph::WorkflowGraph;
use crate::model::{NodeData, NodeId};

/// Opacity of a suggestion at rest.
pub const PREDICTED_IDLE_OPACITY: f32 = 0.5;
/// Opacity while the pointer hovers a suggestion.
pub const PREDICTED_HOVER_OPACITY: f32 = 0.8;

/// An ephemeral suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedNode {
    pub id: NodeId,
    pub data: NodeData,
    pub position: Point,
    pub is_hovered: bool,
}

impl PredictedNode {
    pub fn opacity(&self) -> f32 {
        if self.is_hovered {
            PREDICTED_HOVER_OPACITY
        } else {
            PREDICTED_IDLE_OPACITY
        }
    }
}

/// The suggestions currently on display.
///
/// Held apart from [`WorkflowGraph`], so predictions never take part in edge
/// validation or required-input checks.
#[derive(Debug, Default, Clone)]
pub struct PredictedNodes {
    items: Vec<PredictedNode>,
}

impl PredictedNodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display a new suggestion and return its id.
    pub fn show(&mut self, data: NodeData, position: Point) -> NodeId {
        let id = NodeId::generate();
        self.items.push(PredictedNode {
            id: id.clone(),
            data,
            position,
            is_hovered: false,
        });
        id
    }

    pub fn get(&self, id: &NodeId) -> Option<&PredictedNode> {
        self.items.iter().find(|p| &p.id == id)
    }

    /// Visual-only hover state. Returns false for unknown ids.
    pub fn set_hovered(&mut self, id: &NodeId, hovered: bool) -> bool {
        match self.items.iter_mut().find(|p| &p.id == id) {
            Some(p) => {
                p.is_hovered = hovered;
                true
            }
            None => false,
        }
    }

    pub fn opacity(&self, id: &NodeId) -> Option<f32> {
        self.get(id).map(PredictedNode::opacity)
    }

    /// Promote a suggestion into a real node at its current position.
    ///
    /// The suggestion is discarded; the new node gets a fresh id from the graph.
    pub fn materialize(&mut self, id: &NodeId, graph: &mut WorkflowGraph) -> Option<NodeId> {
        let predicted = self.discard(id)?;
        let node_id = graph.add_node(predicted.data, predicted.position);
        debug!("materialized prediction {} as {}", id, node_id);
        Some(node_id)
    }

    pub fn discard(&mut self, id: &NodeId) -> Option<PredictedNode> {
        let index = self.items.iter().position(|p| &p.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PredictedNode> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
