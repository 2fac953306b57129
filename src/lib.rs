//! # Workflow Canvas
//!
//! A node-graph canvas editing engine for visual workflow editors: a directed
//! graph of typed nodes and edges on an infinite pannable, zoomable plane,
//! with pointer gestures resolved into validated graph mutations.
//!
//! ## Features
//!
//! - **Graph model** - nodes, typed ports, edges, pluggable edge validators
//! - **Interaction state machine** - dragging, connecting with snap, panning, box selection
//! - **Stable edge geometry** - stubbed, direction-aware cubic Bezier paths
//! - **Schema providers** - one-hop propagation of a schema into connected nodes
//! - **Slint bindings** - callback factories and `VecModel` synchronization
//!
//! ## Quick Start
//!
//! ```ignore
//! use workflow_canvas::{EditorConfig, EditorHandle, NodeCatalog};
//!
//! let catalog = NodeCatalog::from_json(&payload)?;
//! let handle = EditorHandle::new(EditorConfig::default());
//!
//! window.on_port_pointer_down(handle.port_pointer_down_callback());
//! window.on_pointer_move(handle.pointer_move_callback());
//! window.on_pointer_up(handle.pointer_up_callback());
//!
//! if let Some(template) = catalog.template("Summarize") {
//!     handle.controller().borrow_mut().add_node_at_screen(template, drop_point);
//! }
//! ```
//!
//! ## Coordinate spaces
//!
//! Node positions are stored in **world** space. Pointer input, port positions
//! in the [`PortRegistry`] and every edge path are in **screen** space; the
//! [`Viewport`] converts between the two.
//!
//! ## Modules
//!
//! - [`graph`] - [`WorkflowGraph`] and edge validation
//! - [`controller`] - [`InteractionController`], the single mutation path
//! - [`state`] - [`PortRegistry`], the screen-space port map
//! - [`hit_test`] - snap resolution, edge and box hit testing
//! - [`path`] - edge path construction
//! - [`links`] - [`EdgePathManager`], computed paths and model sync
//! - [`tracking`] - [`EditorHandle`] with ready-made callbacks
//! - [`layout`] - grid placement and, with the `layout` feature, layered arrangement

pub mod catalog;
pub mod compat;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod links;
pub mod model;
pub mod path;
pub mod predicted;
pub mod selection;
pub mod state;
pub mod tracking;

pub use catalog::{CatalogCategory, CatalogEntry, CatalogFunction, NodeCatalog, NodeSpec};
pub use compat::{are_types_compatible, ANY_TYPE};
pub use config::{EditorConfig, GridPlacement, InputPolicy, NodeMetrics};
pub use controller::{
    is_form_control, EdgePreview, GestureOutcome, InteractionController, InteractionState, Key, KeyEvent,
    PointerButton, PointerEvent, PointerTarget,
};
pub use error::{CatalogError, ConfigError, ConnectError, GraphError};
pub use geometry::{screen_to_world, world_to_screen, Point, Rect, Viewport};
pub use graph::{
    normalize_edge_direction, validate_required_inputs, BasicEdgeValidator, CompositeValidator, EdgeValidator,
    NoDuplicatesValidator, RequiredInputCheck, SingleInputValidator, TypeCompatibilityValidator, WorkflowGraph,
};
pub use hit_test::{
    find_closest_snap_target, find_edge_at, nodes_in_selection_box, EdgeGeometry, NodeGeometry,
    SimpleEdgeGeometry, SimpleNodeGeometry,
};
pub use layout::grid_layout;
pub use links::{ComputedEdge, EdgePathManager, TypeColors};
pub use model::{
    Edge, EdgeId, Endpoint, Node, NodeData, NodeId, NodeKind, Parameter, Port, PortDirection, PortKey,
    WorkflowDocument,
};
pub use path::{build_edge_path, EdgePath, EdgePathConfig, PathEndpoint};
pub use predicted::{PredictedNode, PredictedNodes};
pub use selection::SelectionManager;
pub use state::PortRegistry;
pub use tracking::EditorHandle;
