//! Ready-made Slint callbacks around a shared [`InteractionController`].
//!
//! [`EditorHandle`] wraps the controller in `Rc<RefCell<_>>`, timestamps pointer
//! events, and hands out closures whose signatures match the callbacks a Slint
//! canvas component declares.
//!
//! # Example
//!
//! ```ignore
//! use workflow_canvas::{EditorConfig, EditorHandle};
//!
//! let handle = EditorHandle::new(EditorConfig::default());
//!
//! // Wire up callbacks (one-time setup)
//! window.on_node_pointer_down(handle.node_pointer_down_callback());
//! window.on_port_pointer_down(handle.port_pointer_down_callback());
//! window.on_canvas_pointer_down(handle.canvas_pointer_down_callback());
//! window.on_pointer_move(handle.pointer_move_callback());
//! window.on_pointer_up(handle.pointer_up_callback());
//! window.on_compute_edge_path(handle.compute_edge_path_callback());
//!
//! // React to committed changes
//! handle.on_outcome(move |outcome| log::info!("{:?}", outcome));
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use slint::SharedString;

use crate::config::EditorConfig;
use crate::controller::{GestureOutcome, InteractionController, Key, KeyEvent, PointerEvent, PointerTarget};
use crate::geometry::{Point, Viewport};
use crate::model::{EdgeId, NodeId, PortDirection, PortKey};

type OutcomeHook = Rc<dyn Fn(&GestureOutcome)>;

fn direction(is_input: bool) -> PortDirection {
    if is_input {
        PortDirection::Input
    } else {
        PortDirection::Output
    }
}

/// Map the text of a Slint key event to a [`Key`].
fn key_from_text(text: &str) -> Option<Key> {
    let mut chars = text.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Some(match c {
        '\u{7f}' => Key::Delete,
        '\u{8}' => Key::Backspace,
        '\u{1b}' => Key::Escape,
        c => Key::Char(c),
    })
}

/// Shared handle to the editor; clone it into every callback.
#[derive(Clone)]
pub struct EditorHandle {
    controller: Rc<RefCell<InteractionController>>,
    clock: Rc<dyn Fn() -> u64>,
    hook: Rc<RefCell<Option<OutcomeHook>>>,
}

impl EditorHandle {
    /// Create a handle whose clock counts milliseconds since creation.
    pub fn new(config: EditorConfig) -> Self {
        let started = Instant::now();
        Self::with_clock(config, move || started.elapsed().as_millis() as u64)
    }

    /// Create a handle with a custom millisecond clock (useful in tests).
    pub fn with_clock<C>(config: EditorConfig, clock: C) -> Self
    where
        C: Fn() -> u64 + 'static,
    {
        Self {
            controller: Rc::new(RefCell::new(InteractionController::new(config))),
            clock: Rc::new(clock),
            hook: Rc::new(RefCell::new(None)),
        }
    }

    /// Get a clone of the internal controller reference.
    pub fn controller(&self) -> Rc<RefCell<InteractionController>> {
        self.controller.clone()
    }

    /// Register a function called after every gesture or key press that did something.
    ///
    /// The controller is no longer borrowed when the hook runs, so the hook may
    /// read from it (e.g. to refresh models).
    pub fn on_outcome<F>(&self, hook: F)
    where
        F: Fn(&GestureOutcome) + 'static,
    {
        *self.hook.borrow_mut() = Some(Rc::new(hook));
    }

    pub fn now(&self) -> u64 {
        (self.clock)()
    }

    fn notify(&self, outcome: GestureOutcome) -> GestureOutcome {
        if outcome != GestureOutcome::None {
            let hook = self.hook.borrow().clone();
            if let Some(hook) = hook {
                hook(&outcome);
            }
        }
        outcome
    }

    /// Forward a pointer-down and notify the hook.
    pub fn pointer_down(&self, position: Point, target: PointerTarget, shift: bool) -> GestureOutcome {
        let event = PointerEvent::new(position, self.now(), target).with_shift(shift);
        let outcome = self.controller.borrow_mut().pointer_down(event);
        self.notify(outcome)
    }

    pub fn pointer_up(&self, position: Point) -> GestureOutcome {
        let time = self.now();
        let outcome = self.controller.borrow_mut().pointer_up(position, time);
        self.notify(outcome)
    }

    pub fn key(&self, event: KeyEvent) -> GestureOutcome {
        let outcome = self.controller.borrow_mut().key(event);
        self.notify(outcome)
    }

    // --- callback factories ---

    /// `(node_id, port_id, is_input, rel_x, rel_y)`: port offset measured by the renderer.
    pub fn port_position_callback(&self) -> impl Fn(SharedString, SharedString, bool, f32, f32) + Clone {
        let controller = self.controller.clone();
        move |node_id, port_id, is_input, rel_x, rel_y| {
            controller.borrow_mut().report_port_offsets(
                &NodeId::new(node_id.as_str()),
                [(port_id.to_string(), direction(is_input), Point::new(rel_x, rel_y))],
            );
        }
    }

    /// `(node_id, x, y, shift)`
    pub fn node_pointer_down_callback(&self) -> impl Fn(SharedString, f32, f32, bool) + Clone {
        let handle = self.clone();
        move |node_id, x, y, shift| {
            handle.pointer_down(
                Point::new(x, y),
                PointerTarget::NodeBody(NodeId::new(node_id.as_str())),
                shift,
            );
        }
    }

    /// `(node_id, element, x, y, shift)` for pointer-downs inside a node's content.
    pub fn node_element_pointer_down_callback(&self) -> impl Fn(SharedString, SharedString, f32, f32, bool) + Clone {
        let handle = self.clone();
        move |node_id, element, x, y, shift| {
            handle.pointer_down(
                Point::new(x, y),
                PointerTarget::node_element(node_id.as_str(), element.as_str()),
                shift,
            );
        }
    }

    /// `(node_id, port_id, is_input, x, y)`
    pub fn port_pointer_down_callback(&self) -> impl Fn(SharedString, SharedString, bool, f32, f32) + Clone {
        let handle = self.clone();
        move |node_id, port_id, is_input, x, y| {
            let key = PortKey::new(node_id.as_str(), port_id.as_str(), direction(is_input));
            handle.pointer_down(Point::new(x, y), PointerTarget::Port(key), false);
        }
    }

    /// `(x, y, shift)`; edges under the pointer are hit-tested first.
    pub fn canvas_pointer_down_callback(&self) -> impl Fn(f32, f32, bool) + Clone {
        let handle = self.clone();
        move |x, y, shift| {
            let position = Point::new(x, y);
            let target = if shift {
                PointerTarget::Canvas
            } else {
                handle.controller.borrow().resolve_canvas_target(position)
            };
            handle.pointer_down(position, target, shift);
        }
    }

    /// `(edge_id)`
    pub fn edge_clicked_callback(&self) -> impl Fn(SharedString) + Clone {
        let handle = self.clone();
        move |edge_id| {
            handle.pointer_down(Point::ZERO, PointerTarget::Edge(EdgeId::new(edge_id.as_str())), false);
        }
    }

    /// `(predicted_node_id)`
    pub fn predicted_clicked_callback(&self) -> impl Fn(SharedString) + Clone {
        let handle = self.clone();
        move |id| {
            handle.pointer_down(
                Point::ZERO,
                PointerTarget::PredictedNode(NodeId::new(id.as_str())),
                false,
            );
        }
    }

    /// `(x, y)`
    pub fn pointer_move_callback(&self) -> impl Fn(f32, f32) + Clone {
        let controller = self.controller.clone();
        move |x, y| controller.borrow_mut().pointer_move(Point::new(x, y))
    }

    /// `(x, y)`
    pub fn pointer_up_callback(&self) -> impl Fn(f32, f32) + Clone {
        let handle = self.clone();
        move |x, y| {
            handle.pointer_up(Point::new(x, y));
        }
    }

    /// `(text, ctrl, shift)` from a key-pressed handler; returns whether the key was used.
    pub fn key_pressed_callback(&self) -> impl Fn(SharedString, bool, bool) -> bool + Clone {
        let handle = self.clone();
        move |text, ctrl, shift| {
            let Some(key) = key_from_text(&text) else {
                return false;
            };
            handle.key(KeyEvent { key, ctrl, shift }) != GestureOutcome::None
        }
    }

    /// `(x, y, delta_y)`
    pub fn wheel_callback(&self) -> impl Fn(f32, f32, f32) + Clone {
        let controller = self.controller.clone();
        move |x, y, delta_y| controller.borrow_mut().wheel(Point::new(x, y), delta_y)
    }

    /// `(edge_id) -> path commands`
    pub fn compute_edge_path_callback(&self) -> impl Fn(SharedString) -> SharedString + Clone {
        let controller = self.controller.clone();
        move |edge_id| {
            let ctrl = controller.borrow();
            SharedString::from(ctrl.edge_paths().svg(&EdgeId::new(edge_id.as_str())))
        }
    }

    /// `() -> path commands` of the connection being drawn, empty when idle.
    pub fn preview_path_callback(&self) -> impl Fn() -> SharedString + Clone {
        let controller = self.controller.clone();
        move || SharedString::from(controller.borrow().edge_paths().preview_svg())
    }

    /// `(zoom, pan_x, pan_y)` when the view changes outside of gestures.
    pub fn viewport_changed_callback(&self) -> impl Fn(f32, f32, f32) + Clone {
        let controller = self.controller.clone();
        move |zoom, pan_x, pan_y| {
            controller
                .borrow_mut()
                .set_viewport(Viewport::new(pan_x, pan_y, zoom));
        }
    }
}
