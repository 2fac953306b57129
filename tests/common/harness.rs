//! Scripted canvas for integration tests.
//!
//! Wraps an [`EditorHandle`] with a manual clock, outcome tracking and bound
//! Slint models, plus helper methods that simulate complete user gestures.

#![allow(dead_code)]

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use slint::{Color, SharedString, VecModel};
use workflow_canvas::{
    world_to_screen, EditorConfig, EditorHandle, GestureOutcome, InteractionController, Key, KeyEvent, NodeData,
    NodeId, Point, PointerTarget, PortKey,
};

use super::{init_logging, OutcomeTracker};

/// Row type for the bound edge-path model.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRow {
    pub id: SharedString,
    pub path: SharedString,
    pub color: Color,
    pub width: f32,
}

/// How long a deliberate drag takes; well above the click threshold.
pub const DRAG_MS: u64 = 300;
/// How long a click takes; below the click threshold.
pub const CLICK_MS: u64 = 50;

pub struct CanvasHarness {
    pub handle: EditorHandle,
    pub controller: Rc<RefCell<InteractionController>>,
    pub clock: Rc<Cell<u64>>,
    pub tracker: OutcomeTracker,
    pub edge_rows: Rc<VecModel<EdgeRow>>,
    pub selection_model: Rc<VecModel<SharedString>>,
}

impl CanvasHarness {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        init_logging();
        let clock = Rc::new(Cell::new(1_000));
        let handle = EditorHandle::with_clock(config, {
            let clock = clock.clone();
            move || clock.get()
        });
        let controller = handle.controller();
        let tracker = OutcomeTracker::new();
        let edge_rows = Rc::new(VecModel::<EdgeRow>::default());
        let selection_model = Rc::new(VecModel::<SharedString>::default());

        controller
            .borrow_mut()
            .edge_paths_mut()
            .bind_model(edge_rows.clone(), |id, path, color, width| EdgeRow { id, path, color, width });

        handle.on_outcome({
            let controller = controller.clone();
            let tracker = tracker.clone();
            let selection_model = selection_model.clone();
            move |outcome| {
                tracker.record(outcome);
                controller.borrow().selection().sync_to_model(&selection_model);
            }
        });

        Self {
            handle,
            controller,
            clock,
            tracker,
            edge_rows,
            selection_model,
        }
    }

    pub fn ctrl(&self) -> Ref<'_, InteractionController> {
        self.controller.borrow()
    }

    pub fn ctrl_mut(&self) -> RefMut<'_, InteractionController> {
        self.controller.borrow_mut()
    }

    pub fn advance(&self, ms: u64) {
        self.clock.set(self.clock.get() + ms);
    }

    // === Setup ===

    /// Add a node with its top-left corner at a screen position.
    pub fn add_node(&self, data: NodeData, x: f32, y: f32) -> NodeId {
        self.ctrl_mut().add_node_at_screen(data, Point::new(x, y))
    }

    /// Prompt -> Summarize -> Output, left to right, already connected.
    pub fn pipeline(&self) -> (NodeId, NodeId, NodeId) {
        let a = self.add_node(super::prompt(), 0.0, 0.0);
        let b = self.add_node(super::summarize(), 400.0, 0.0);
        let c = self.add_node(super::output(), 800.0, 0.0);
        {
            let mut ctrl = self.ctrl_mut();
            ctrl.connect(&PortKey::output(a.clone(), "text"), &PortKey::input(b.clone(), "text"))
                .expect("prompt -> summarize");
            ctrl.connect(&PortKey::output(b.clone(), "summary"), &PortKey::input(c.clone(), "value"))
                .expect("summarize -> output");
        }
        (a, b, c)
    }

    // === Queries ===

    pub fn port(&self, key: &PortKey) -> Point {
        self.ctrl()
            .port_position(key)
            .unwrap_or_else(|| panic!("port {} is not rendered", key))
    }

    /// A point inside the node header, in screen space.
    pub fn node_header(&self, id: &NodeId) -> Point {
        let ctrl = self.ctrl();
        let node = ctrl.graph().node(id).expect("node exists");
        world_to_screen(node.position, &ctrl.container(), &ctrl.viewport()).offset(20.0, 10.0)
    }

    pub fn position(&self, id: &NodeId) -> Point {
        self.ctrl().graph().node(id).expect("node exists").position
    }

    pub fn edge_count(&self) -> usize {
        self.ctrl().graph().edges().len()
    }

    pub fn selected(&self) -> Vec<NodeId> {
        self.ctrl().selection().to_vec()
    }

    // === Gestures ===

    pub fn click_node(&self, id: &NodeId, shift: bool) -> GestureOutcome {
        let at = self.node_header(id);
        self.handle.pointer_down(at, PointerTarget::NodeBody(id.clone()), shift);
        self.advance(CLICK_MS);
        self.handle.pointer_up(at.offset(1.0, 0.0))
    }

    /// Drag a node by a screen-space delta in a few intermediate steps.
    pub fn drag_node(&self, id: &NodeId, dx: f32, dy: f32) -> GestureOutcome {
        let from = self.node_header(id);
        self.handle.pointer_down(from, PointerTarget::NodeBody(id.clone()), false);
        for t in [0.25, 0.5, 1.0] {
            self.ctrl_mut().pointer_move(from.offset(dx * t, dy * t));
        }
        self.advance(DRAG_MS);
        self.handle.pointer_up(from.offset(dx, dy))
    }

    /// Press on a port, move to `to` and release there.
    pub fn drag_from_port(&self, origin: &PortKey, to: Point) -> GestureOutcome {
        let from = self.port(origin);
        self.handle.pointer_down(from, PointerTarget::Port(origin.clone()), false);
        self.ctrl_mut().pointer_move(from.add(to).scale(0.5));
        self.ctrl_mut().pointer_move(to);
        self.advance(DRAG_MS);
        self.handle.pointer_up(to)
    }

    /// Draw a connection between two ports, releasing slightly off the target.
    pub fn connect_by_drag(&self, origin: &PortKey, target: &PortKey) -> GestureOutcome {
        let to = self.port(target).offset(6.0, 4.0);
        self.drag_from_port(origin, to)
    }

    pub fn click_canvas(&self, at: Point) -> GestureOutcome {
        let target = self.ctrl().resolve_canvas_target(at);
        self.handle.pointer_down(at, target, false);
        self.advance(CLICK_MS);
        self.handle.pointer_up(at)
    }

    pub fn pan(&self, from: Point, dx: f32, dy: f32) -> GestureOutcome {
        self.handle.pointer_down(from, PointerTarget::Canvas, false);
        self.ctrl_mut().pointer_move(from.offset(dx, dy));
        self.advance(DRAG_MS);
        self.handle.pointer_up(from.offset(dx, dy))
    }

    pub fn box_select(&self, from: Point, to: Point) -> GestureOutcome {
        self.handle.pointer_down(from, PointerTarget::Canvas, true);
        self.ctrl_mut().pointer_move(to);
        self.advance(DRAG_MS);
        self.handle.pointer_up(to)
    }

    pub fn press(&self, key: Key) -> GestureOutcome {
        self.handle.key(KeyEvent::plain(key))
    }

    pub fn press_ctrl(&self, c: char) -> GestureOutcome {
        self.handle.key(KeyEvent::ctrl(c))
    }
}
