use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::NodeMetrics;
use crate::geometry::{world_to_screen, Point, Rect, Viewport};
use crate::model::{Node, NodeId, PortDirection, PortKey};

#[derive(Clone, Copy, Debug, PartialEq)]
struct StoredNode {
    /// World-space box
    rect: Rect,
    expanded: bool,
}

/// Port Registry: the spatial state of the editor.
///
/// A renderer's layout pass reports, per port, a static offset relative to the
/// node origin (world units). Together with the node origins this produces the
/// screen-space `PortKey -> Point` map read by the snap resolver and the edge
/// path builder. The map is a derived cache: it is rebuilt from scratch after
/// every geometry-affecting change and never edited in place.
#[derive(Debug, Default, Clone)]
pub struct PortRegistry {
    offsets: HashMap<PortKey, Point>,
    nodes: HashMap<NodeId, StoredNode>,
    positions: BTreeMap<PortKey, Point>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the offset of one port, as measured by the renderer.
    pub fn register_port_ref(&mut self, node_id: &NodeId, port_id: &str, direction: PortDirection, offset: Point) {
        self.offsets
            .insert(PortKey::new(node_id.clone(), port_id, direction), offset);
    }

    /// Compute default port offsets and the node box from `metrics`.
    ///
    /// Replaces every offset previously registered for this node.
    pub fn register_node_ports(&mut self, node: &Node, metrics: &NodeMetrics) {
        self.offsets.retain(|key, _| key.node_id != node.id);

        for (i, port) in node.data.inputs.iter().enumerate() {
            self.offsets.insert(
                node.port_key(&port.id, PortDirection::Input),
                metrics.port_offset(i, PortDirection::Input, node.is_expanded),
            );
        }
        for (i, port) in node.data.outputs.iter().enumerate() {
            self.offsets.insert(
                node.port_key(&port.id, PortDirection::Output),
                metrics.port_offset(i, PortDirection::Output, node.is_expanded),
            );
        }

        let (width, height) = metrics.node_size(node);
        self.nodes.insert(
            node.id.clone(),
            StoredNode {
                rect: Rect::new(node.position.x, node.position.y, width, height),
                expanded: node.is_expanded,
            },
        );
    }

    /// Bring node origins in line with the graph.
    ///
    /// New nodes, nodes whose expansion state changed and nodes that gained a
    /// port get default offsets from `metrics`. Every box is resized to the
    /// node's current content. Nodes that no longer exist are dropped along
    /// with their ports.
    pub fn sync_nodes<'a, I>(&mut self, nodes: I, metrics: &NodeMetrics)
    where
        I: IntoIterator<Item = &'a Node>,
    {
        let mut alive: HashSet<&NodeId> = HashSet::new();

        for node in nodes {
            alive.insert(&node.id);
            let unchanged = self
                .nodes
                .get(&node.id)
                .is_some_and(|stored| stored.expanded == node.is_expanded)
                && self.has_all_ports(node);

            if !unchanged {
                self.register_node_ports(node, metrics);
            } else if let Some(stored) = self.nodes.get_mut(&node.id) {
                let (width, height) = metrics.node_size(node);
                stored.rect = Rect::new(node.position.x, node.position.y, width, height);
            }
        }

        self.nodes.retain(|id, _| alive.contains(id));
        self.offsets.retain(|key, _| alive.contains(&key.node_id));
    }

    fn has_all_ports(&self, node: &Node) -> bool {
        let inputs = node.data.inputs.iter().map(|p| (p, PortDirection::Input));
        let outputs = node.data.outputs.iter().map(|p| (p, PortDirection::Output));
        inputs
            .chain(outputs)
            .all(|(port, direction)| self.offsets.contains_key(&node.port_key(&port.id, direction)))
    }

    /// Recompute the screen-space port map for the current camera.
    ///
    /// Offsets that reference an unknown node are skipped.
    pub fn rebuild(&mut self, container: &Rect, view: &Viewport) {
        self.positions.clear();
        for (key, offset) in &self.offsets {
            if let Some(node) = self.nodes.get(&key.node_id) {
                let world = node.rect.origin().add(*offset);
                self.positions
                    .insert(key.clone(), world_to_screen(world, container, view));
            }
        }
    }

    /// Screen-space port positions from the last rebuild.
    pub fn positions(&self) -> &BTreeMap<PortKey, Point> {
        &self.positions
    }

    pub fn position(&self, key: &PortKey) -> Option<Point> {
        self.positions.get(key).copied()
    }

    pub fn contains(&self, key: &PortKey) -> bool {
        self.positions.contains_key(key)
    }

    /// World-space box of a node.
    pub fn node_rect(&self, node_id: &NodeId) -> Option<Rect> {
        self.nodes.get(node_id).map(|n| n.rect)
    }

    /// Iterator over `(node id, world-space box)` pairs.
    pub fn node_rects(&self) -> impl Iterator<Item = (&NodeId, Rect)> + '_ {
        self.nodes.iter().map(|(id, n)| (id, n.rect))
    }

    pub fn remove_node(&mut self, node_id: &NodeId) {
        self.nodes.remove(node_id);
        self.offsets.retain(|key, _| &key.node_id != node_id);
        self.positions.retain(|key, _| &key.node_id != node_id);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
        self.nodes.clear();
        self.positions.clear();
    }
}
