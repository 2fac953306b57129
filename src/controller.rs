//! Interaction controller: turns pointer and keyboard input into graph mutations.
//!
//! The [`InteractionController`] owns the graph, the port registry, the
//! selection and the computed edge paths, and is the only path through which
//! they change. After every mutation the registry is rebuilt before any edge
//! path is recomputed, so paths never read stale port positions.
//!
//! # Example
//!
//! ```ignore
//! use workflow_canvas::{EditorConfig, InteractionController, PointerEvent, PointerTarget};
//!
//! let mut ctrl = InteractionController::new(EditorConfig::default());
//! let a = ctrl.add_node_at_screen(source_template, Point::new(100.0, 100.0));
//! let b = ctrl.add_node_at_screen(sink_template, Point::new(500.0, 100.0));
//!
//! // Drag from an output port and release over an input port
//! let out = PortKey::output(a, "out");
//! let start = ctrl.port_position(&out).unwrap();
//! ctrl.pointer_down(PointerEvent::new(start, 0, PointerTarget::Port(out)));
//! ctrl.pointer_move(target_pos);
//! let outcome = ctrl.pointer_up(target_pos, 300);
//! ```

use log::{debug, warn};

use crate::config::EditorConfig;
use crate::error::{ConnectError, GraphError};
use crate::geometry::{screen_to_world, Point, Rect, Viewport};
use crate::graph::WorkflowGraph;
use crate::hit_test::{find_closest_snap_target, nodes_in_selection_box, SimpleNodeGeometry};
use crate::layout::grid_layout;
use crate::links::EdgePathManager;
use crate::model::{EdgeId, NodeData, NodeId, PortDirection, PortKey, WorkflowDocument};
use crate::predicted::PredictedNodes;
use crate::selection::SelectionManager;
use crate::state::PortRegistry;

/// World-space shift applied to pasted nodes.
pub const PASTE_OFFSET: Point = Point::new(40.0, 40.0);

/// Markers of elements that keep pointer input for themselves.
pub const FORM_CONTROL_MARKERS: &[&str] = &["input", "textarea", "select", "button", "option", "[contenteditable]"];

/// True if a pointer-down on `element` must not start a node drag.
pub fn is_form_control(element: &str) -> bool {
    let element = element.trim().to_ascii_lowercase();
    FORM_CONTROL_MARKERS.contains(&element.as_str()) || element.contains("contenteditable")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// What the pointer went down on, as reported by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerTarget {
    /// Empty canvas
    Canvas,
    /// Node header or body
    NodeBody(NodeId),
    /// An element inside a node, e.g. a parameter editor
    NodeElement { node_id: NodeId, element: String },
    Port(PortKey),
    Edge(EdgeId),
    PredictedNode(NodeId),
}

impl PointerTarget {
    pub fn node_element(node_id: impl Into<NodeId>, element: impl Into<String>) -> Self {
        PointerTarget::NodeElement {
            node_id: node_id.into(),
            element: element.into(),
        }
    }
}

/// A pointer-down in screen space.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    pub time_ms: u64,
    pub button: PointerButton,
    pub target: PointerTarget,
    pub shift: bool,
}

impl PointerEvent {
    pub fn new(position: Point, time_ms: u64, target: PointerTarget) -> Self {
        Self {
            position,
            time_ms,
            button: PointerButton::Primary,
            target,
            shift: false,
        }
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        Self { key, ctrl: false, shift: false }
    }

    pub fn ctrl(c: char) -> Self {
        Self {
            key: Key::Char(c),
            ctrl: true,
            shift: false,
        }
    }
}

/// The connection being drawn. Positions are in screen space.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePreview {
    pub origin: PortKey,
    pub start_pos: Point,
    pub target_pos: Point,
    pub snap_target: Option<PortKey>,
}

/// A node drag in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDrag {
    pub node_id: NodeId,
    /// Every node that moves with the pointer
    pub nodes: Vec<NodeId>,
    pub start: Point,
    pub last: Point,
    /// Accumulated world-space movement
    pub total: Point,
    /// Largest screen distance from `start` seen so far
    pub travel: f32,
    pub start_ms: u64,
    pub shift: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionState {
    Idle,
    NodeDragging(NodeDrag),
    EdgeDrawing {
        preview: EdgePreview,
        start_ms: u64,
    },
    PanningCanvas {
        start: Point,
        last: Point,
        start_viewport: Viewport,
        travel: f32,
        start_ms: u64,
    },
    BoxSelecting {
        start: Point,
        current: Point,
        travel: f32,
        start_ms: u64,
    },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::NodeDragging(_) => "node-dragging",
            InteractionState::EdgeDrawing { .. } => "edge-drawing",
            InteractionState::PanningCanvas { .. } => "panning",
            InteractionState::BoxSelecting { .. } => "box-selecting",
        }
    }
}

/// What a completed gesture or key press did.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    None,
    NodeSelected(NodeId),
    NodesMoved(Vec<NodeId>),
    SelectionCleared,
    SelectionChanged(usize),
    EdgeCreated(EdgeId),
    EdgeRejected(ConnectError),
    EdgeDiscarded,
    EdgeDeleted(EdgeId),
    NodesDeleted(Vec<NodeId>),
    PredictionMaterialized(NodeId),
    Panned,
    Copied(usize),
    Pasted(Vec<NodeId>),
    Aborted,
}

/// The editor state machine: `Idle -> NodeDragging | EdgeDrawing | PanningCanvas | BoxSelecting -> Idle`.
pub struct InteractionController {
    config: EditorConfig,
    graph: WorkflowGraph,
    registry: PortRegistry,
    selection: SelectionManager,
    predicted: PredictedNodes,
    edges: EdgePathManager,
    container: Rect,
    viewport: Viewport,
    state: InteractionState,
    clipboard: Option<WorkflowDocument>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl InteractionController {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            graph: WorkflowGraph::with_policy(config.input_policy),
            config,
            registry: PortRegistry::new(),
            selection: SelectionManager::new(),
            predicted: PredictedNodes::new(),
            edges: EdgePathManager::new(),
            container: Rect::default(),
            viewport: Viewport::default(),
            state: InteractionState::Idle,
            clipboard: None,
        }
    }

    // --- accessors ---

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn predicted(&self) -> &PredictedNodes {
        &self.predicted
    }

    pub fn edge_paths(&self) -> &EdgePathManager {
        &self.edges
    }

    pub fn edge_paths_mut(&mut self) -> &mut EdgePathManager {
        &mut self.edges
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn container(&self) -> Rect {
        self.container
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn preview(&self) -> Option<&EdgePreview> {
        match &self.state {
            InteractionState::EdgeDrawing { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// Screen-space rubber band while box selecting.
    pub fn selection_box(&self) -> Option<Rect> {
        match &self.state {
            InteractionState::BoxSelecting { start, current, .. } => Some(Rect::from_corners(*start, *current)),
            _ => None,
        }
    }

    /// Screen-space position of a port after the last relayout.
    pub fn port_position(&self, key: &PortKey) -> Option<Point> {
        self.registry.position(key)
    }

    pub fn clipboard(&self) -> Option<&WorkflowDocument> {
        self.clipboard.as_ref()
    }

    /// Edge under `position`, or [`PointerTarget::Canvas`].
    ///
    /// For renderers that do not give edges their own hit regions.
    pub fn resolve_canvas_target(&self, position: Point) -> PointerTarget {
        match self
            .edges
            .find_edge_at(position, self.config.edge_hit_distance, self.config.edge_hit_samples)
        {
            Some(id) => PointerTarget::Edge(id),
            None => PointerTarget::Canvas,
        }
    }

    // --- layout ---

    /// Rebuild the port registry and every edge path from the current graph and camera.
    pub fn relayout(&mut self) {
        self.registry.sync_nodes(self.graph.nodes(), &self.config.node_metrics);
        self.registry.rebuild(&self.container, &self.viewport);
        self.graph.prune_edges_not_in(&self.registry);

        let origin_pos = match &self.state {
            InteractionState::EdgeDrawing { preview, .. } => Some(self.registry.position(&preview.origin)),
            _ => None,
        };
        match origin_pos {
            Some(None) => {
                warn!("edge origin disappeared, dropping preview");
                self.state = InteractionState::Idle;
            }
            Some(Some(pos)) => {
                if let InteractionState::EdgeDrawing { preview, .. } = &mut self.state {
                    preview.start_pos = pos;
                }
            }
            None => {}
        }

        let path_config = self.config.edge_path.scaled(self.viewport.effective_scale());
        self.edges.update(&self.graph, &self.registry, &path_config);
        let preview = match &self.state {
            InteractionState::EdgeDrawing { preview, .. } => Some(preview),
            _ => None,
        };
        self.edges
            .update_preview(preview, &self.graph, &self.registry, &path_config);
    }

    /// Port offsets measured by the renderer for one node, relative to its origin.
    pub fn report_port_offsets<I>(&mut self, node_id: &NodeId, offsets: I)
    where
        I: IntoIterator<Item = (String, PortDirection, Point)>,
    {
        if !self.graph.contains_node(node_id) {
            return;
        }
        // Make sure the node box exists before measured offsets replace the defaults
        self.registry.sync_nodes(self.graph.nodes(), &self.config.node_metrics);
        for (port_id, direction, offset) in offsets {
            self.registry.register_port_ref(node_id, &port_id, direction, offset);
        }
        self.relayout();
    }

    pub fn set_container(&mut self, container: Rect) {
        self.container = container;
        self.relayout();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.relayout();
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.viewport.pan_by(dx, dy);
        self.relayout();
    }

    /// Zoom around the pointer. Negative `delta_y` (wheel up) zooms in.
    pub fn wheel(&mut self, position: Point, delta_y: f32) {
        if delta_y == 0.0 {
            return;
        }
        let step = self.config.wheel_zoom_step;
        let factor = if delta_y < 0.0 { step } else { 1.0 / step };
        self.viewport.zoom_at(
            position,
            &self.container,
            factor,
            self.config.min_zoom,
            self.config.max_zoom,
        );
        self.relayout();
    }

    // --- pointer gestures ---

    pub fn pointer_down(&mut self, event: PointerEvent) -> GestureOutcome {
        if event.button != PointerButton::Primary {
            return GestureOutcome::None;
        }
        if !self.state.is_idle() {
            // A release we never saw; drop the stale gesture
            self.abort();
        }

        let outcome = match event.target {
            PointerTarget::Canvas => {
                self.state = if event.shift {
                    InteractionState::BoxSelecting {
                        start: event.position,
                        current: event.position,
                        travel: 0.0,
                        start_ms: event.time_ms,
                    }
                } else {
                    InteractionState::PanningCanvas {
                        start: event.position,
                        last: event.position,
                        start_viewport: self.viewport,
                        travel: 0.0,
                        start_ms: event.time_ms,
                    }
                };
                GestureOutcome::None
            }
            PointerTarget::NodeElement { node_id, element } => {
                if is_form_control(&element) {
                    return GestureOutcome::None;
                }
                self.start_node_drag(node_id, &event.position, event.time_ms, event.shift);
                GestureOutcome::None
            }
            PointerTarget::NodeBody(node_id) => {
                self.start_node_drag(node_id, &event.position, event.time_ms, event.shift);
                GestureOutcome::None
            }
            PointerTarget::Port(origin) => {
                if let Some(start_pos) = self.registry.position(&origin) {
                    self.state = InteractionState::EdgeDrawing {
                        preview: EdgePreview {
                            origin,
                            start_pos,
                            target_pos: event.position,
                            snap_target: None,
                        },
                        start_ms: event.time_ms,
                    };
                    self.relayout();
                }
                GestureOutcome::None
            }
            PointerTarget::Edge(id) => {
                if self.delete_edge(&id) {
                    GestureOutcome::EdgeDeleted(id)
                } else {
                    GestureOutcome::None
                }
            }
            PointerTarget::PredictedNode(id) => match self.predicted.materialize(&id, &mut self.graph) {
                Some(node_id) => {
                    self.relayout();
                    GestureOutcome::PredictionMaterialized(node_id)
                }
                None => GestureOutcome::None,
            },
        };

        if !self.state.is_idle() {
            debug!("gesture start: {}", self.state.name());
        }
        outcome
    }

    fn start_node_drag(&mut self, node_id: NodeId, position: &Point, time_ms: u64, shift: bool) {
        if !self.graph.contains_node(&node_id) {
            return;
        }
        let nodes = if self.selection.contains(&node_id) {
            self.selection.to_vec()
        } else {
            vec![node_id.clone()]
        };
        self.state = InteractionState::NodeDragging(NodeDrag {
            node_id,
            nodes,
            start: *position,
            last: *position,
            total: Point::ZERO,
            travel: 0.0,
            start_ms: time_ms,
            shift,
        });
    }

    pub fn pointer_move(&mut self, position: Point) {
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        self.state = match state {
            InteractionState::Idle => return,
            InteractionState::NodeDragging(mut drag) => {
                let step = position.sub(drag.last).scale(1.0 / self.viewport.effective_scale());
                self.graph.translate_nodes(&drag.nodes, step.x, step.y);
                drag.total = drag.total.add(step);
                drag.last = position;
                drag.travel = drag.travel.max(position.sub(drag.start).length());
                InteractionState::NodeDragging(drag)
            }
            InteractionState::EdgeDrawing { mut preview, start_ms } => {
                preview.target_pos = position;
                preview.snap_target = self.resolve_snap(&preview.origin, position);
                InteractionState::EdgeDrawing { preview, start_ms }
            }
            InteractionState::PanningCanvas {
                start,
                last,
                start_viewport,
                travel,
                start_ms,
            } => {
                let step = position.sub(last);
                self.viewport.pan_by(step.x, step.y);
                InteractionState::PanningCanvas {
                    start,
                    last: position,
                    start_viewport,
                    travel: travel.max(position.sub(start).length()),
                    start_ms,
                }
            }
            InteractionState::BoxSelecting {
                start,
                travel,
                start_ms,
                ..
            } => InteractionState::BoxSelecting {
                start,
                current: position,
                travel: travel.max(position.sub(start).length()),
                start_ms,
            },
        };
        self.relayout();
    }

    pub fn pointer_up(&mut self, position: Point, time_ms: u64) -> GestureOutcome {
        // Apply the final position first so releases without a preceding move count
        self.pointer_move(position);

        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        let outcome = match state {
            InteractionState::Idle => GestureOutcome::None,
            InteractionState::NodeDragging(drag) => {
                if self.is_click(drag.start_ms, time_ms, drag.travel) {
                    self.graph.translate_nodes(&drag.nodes, -drag.total.x, -drag.total.y);
                    self.selection.handle_interaction(&drag.node_id, drag.shift);
                    GestureOutcome::NodeSelected(drag.node_id)
                } else {
                    debug!("moved {} node(s)", drag.nodes.len());
                    GestureOutcome::NodesMoved(drag.nodes)
                }
            }
            InteractionState::EdgeDrawing { preview, .. } => {
                match self.resolve_snap(&preview.origin, position) {
                    Some(target) => match self.graph.add_edge(&preview.origin, &target) {
                        Ok(id) => GestureOutcome::EdgeCreated(id),
                        Err(e) => {
                            debug!("connection rejected: {}", e);
                            GestureOutcome::EdgeRejected(e)
                        }
                    },
                    None => GestureOutcome::EdgeDiscarded,
                }
            }
            InteractionState::PanningCanvas {
                start_viewport,
                travel,
                start_ms,
                ..
            } => {
                if self.is_click(start_ms, time_ms, travel) {
                    self.viewport = start_viewport;
                    self.selection.clear();
                    GestureOutcome::SelectionCleared
                } else {
                    GestureOutcome::Panned
                }
            }
            InteractionState::BoxSelecting {
                start,
                current,
                travel,
                start_ms,
            } => {
                if self.is_click(start_ms, time_ms, travel) {
                    self.selection.clear();
                    GestureOutcome::SelectionCleared
                } else {
                    let a = screen_to_world(start, &self.container, &self.viewport);
                    let b = screen_to_world(current, &self.container, &self.viewport);
                    let hits = nodes_in_selection_box(
                        &Rect::from_corners(a, b),
                        self.registry
                            .node_rects()
                            .map(|(id, rect)| SimpleNodeGeometry { id: id.clone(), rect }),
                    );
                    let count = hits.len();
                    self.selection.extend(hits);
                    GestureOutcome::SelectionChanged(count)
                }
            }
        };

        debug!("gesture end: {:?}", outcome);
        self.relayout();
        outcome
    }

    /// Cancel the gesture in flight, undoing its visible effects.
    ///
    /// Returns false if there was nothing to cancel.
    pub fn abort(&mut self) -> bool {
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        match state {
            InteractionState::Idle => return false,
            InteractionState::NodeDragging(drag) => {
                self.graph.translate_nodes(&drag.nodes, -drag.total.x, -drag.total.y);
            }
            InteractionState::PanningCanvas { start_viewport, .. } => {
                self.viewport = start_viewport;
            }
            InteractionState::EdgeDrawing { .. } | InteractionState::BoxSelecting { .. } => {}
        }
        debug!("gesture aborted");
        self.relayout();
        true
    }

    fn is_click(&self, start_ms: u64, end_ms: u64, travel: f32) -> bool {
        end_ms.saturating_sub(start_ms) < self.config.click_max_duration_ms && travel < self.config.click_max_distance
    }

    /// Closest port the edge from `origin` may attach to.
    fn resolve_snap(&self, origin: &PortKey, position: Point) -> Option<PortKey> {
        let graph = &self.graph;
        let accepts = |key: &PortKey| {
            key.direction == origin.direction.opposite()
                && key.node_id != origin.node_id
                && graph.can_connect(origin, key).is_ok()
        };
        find_closest_snap_target(
            position,
            self.registry.positions(),
            self.config.snap_distance,
            Some(&accepts),
        )
    }

    // --- keyboard ---

    pub fn key(&mut self, event: KeyEvent) -> GestureOutcome {
        match event.key {
            Key::Escape => {
                if self.abort() {
                    GestureOutcome::Aborted
                } else {
                    GestureOutcome::None
                }
            }
            Key::Delete | Key::Backspace if self.state.is_idle() => {
                let deleted = self.delete_selection();
                if deleted.is_empty() {
                    GestureOutcome::None
                } else {
                    GestureOutcome::NodesDeleted(deleted)
                }
            }
            Key::Char(c) if event.ctrl && self.state.is_idle() => match c.to_ascii_lowercase() {
                'c' => GestureOutcome::Copied(self.copy_selection()),
                'v' => {
                    let pasted = self.paste();
                    if pasted.is_empty() {
                        GestureOutcome::None
                    } else {
                        GestureOutcome::Pasted(pasted)
                    }
                }
                'a' => {
                    let all: Vec<NodeId> = self.graph.nodes().iter().map(|n| n.id.clone()).collect();
                    let count = all.len();
                    self.selection.replace_selection(all);
                    GestureOutcome::SelectionChanged(count)
                }
                _ => GestureOutcome::None,
            },
            _ => GestureOutcome::None,
        }
    }

    // --- graph editing ---

    /// Add a node where it was dropped on the canvas.
    pub fn add_node_at_screen(&mut self, data: NodeData, position: Point) -> NodeId {
        let world = screen_to_world(position, &self.container, &self.viewport);
        let id = self.graph.add_node(data, world);
        self.relayout();
        id
    }

    /// Add a batch of nodes in a near-square grid.
    pub fn add_nodes_in_grid(&mut self, templates: Vec<NodeData>) -> Vec<NodeId> {
        let positions = grid_layout(templates.len(), &self.config.grid);
        let ids = templates
            .into_iter()
            .zip(positions)
            .map(|(data, position)| self.graph.add_node(data, position))
            .collect();
        self.relayout();
        ids
    }

    /// Programmatic connection; same rules as drawing one.
    pub fn connect(&mut self, a: &PortKey, b: &PortKey) -> Result<EdgeId, ConnectError> {
        let id = self.graph.add_edge(a, b)?;
        self.relayout();
        Ok(id)
    }

    pub fn delete_edge(&mut self, id: &EdgeId) -> bool {
        let removed = self.graph.remove_edge(id).is_some();
        if removed {
            self.relayout();
        }
        removed
    }

    /// Remove the selected nodes and every edge touching them.
    pub fn delete_selection(&mut self) -> Vec<NodeId> {
        let deleted: Vec<NodeId> = self
            .selection
            .to_vec()
            .into_iter()
            .filter(|id| self.graph.remove_node(id).is_some())
            .collect();
        self.selection.clear();
        if !deleted.is_empty() {
            self.relayout();
        }
        deleted
    }

    pub fn toggle_expanded(&mut self, id: &NodeId) -> bool {
        let Some(expanded) = self.graph.node(id).map(|n| n.is_expanded) else {
            return false;
        };
        self.graph.set_expanded(id, !expanded);
        self.relayout();
        true
    }

    pub fn set_parameter_value(&mut self, id: &NodeId, parameter_id: &str, value: serde_json::Value) -> bool {
        let changed = self.graph.set_parameter_value(id, parameter_id, value);
        if changed {
            self.relayout();
        }
        changed
    }

    /// Copy the selected nodes and the edges between them. Returns the node count.
    pub fn copy_selection(&mut self) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        let fragment = self.graph.fragment(&self.selection.to_vec());
        let count = fragment.nodes.len();
        self.clipboard = Some(fragment);
        count
    }

    /// Paste the clipboard shifted by [`PASTE_OFFSET`] and select the copies.
    ///
    /// Repeated pastes cascade instead of stacking on one spot.
    pub fn paste(&mut self) -> Vec<NodeId> {
        let Some(clipboard) = self.clipboard.as_mut() else {
            return Vec::new();
        };
        let created = self.graph.insert_fragment(clipboard, PASTE_OFFSET);
        for node in &mut clipboard.nodes {
            node.position = node.position.add(PASTE_OFFSET);
        }
        self.selection.replace_selection(created.iter().cloned());
        self.relayout();
        created
    }

    /// Rearrange every node in layers, starting at the grid origin.
    #[cfg(feature = "layout")]
    pub fn auto_arrange(&mut self, config: &crate::layout::SugiyamaConfig) {
        let origin = self.config.grid.start;
        for placed in crate::layout::arrange_graph(&self.graph, &self.config.node_metrics, config) {
            let position = origin.offset(placed.x as f32, placed.y as f32);
            self.graph.set_node_position(&placed.id, position);
        }
        debug!("auto-arranged {} node(s)", self.graph.nodes().len());
        self.relayout();
    }

    /// Apply arbitrary graph edits, then relayout.
    pub fn edit_graph<R>(&mut self, edit: impl FnOnce(&mut WorkflowGraph) -> R) -> R {
        let result = edit(&mut self.graph);
        let graph = &self.graph;
        self.selection.retain_existing(|id| graph.contains_node(id));
        self.relayout();
        result
    }

    // --- documents ---

    /// Replace the whole canvas with `doc`. On error nothing changes.
    pub fn load_document(&mut self, doc: WorkflowDocument) -> Result<(), GraphError> {
        self.graph.load_document(doc)?;
        self.state = InteractionState::Idle;
        self.selection.clear();
        self.predicted.clear();
        self.registry.clear();
        self.relayout();
        Ok(())
    }

    pub fn to_document(&self) -> Result<WorkflowDocument, GraphError> {
        self.graph.to_document()
    }

    // --- predictions ---

    /// Show a suggestion at a world-space position.
    pub fn show_prediction(&mut self, data: NodeData, position: Point) -> NodeId {
        self.predicted.show(data, position)
    }

    pub fn hover_prediction(&mut self, id: &NodeId, hovered: bool) -> bool {
        self.predicted.set_hovered(id, hovered)
    }
}
