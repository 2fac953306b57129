//! Edge path management for the canvas.
//!
//! [`EdgePathManager`] turns the committed edges of a [`WorkflowGraph`] plus the
//! current [`PortRegistry`] into renderable paths, and optionally mirrors them
//! into a Slint model.
//!
//! # Example
//!
//! ```ignore
//! use workflow_canvas::{EdgePathManager, InteractionController};
//!
//! let mut controller = InteractionController::new(EditorConfig::default());
//!
//! // Bind once - auto-syncs on every relayout
//! let model = Rc::new(VecModel::<EdgePathItem>::default());
//! controller.edge_paths_mut().bind_model(model.clone(), |id, path, color, width| EdgePathItem {
//!     id,
//!     path_commands: path,
//!     color,
//!     width,
//! });
//! window.set_edge_paths(ModelRc::from(model));
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use log::trace;
use slint::{Color, Model, SharedString, VecModel};

use crate::controller::EdgePreview;
use crate::graph::WorkflowGraph;
use crate::hit_test::{find_edge_at, EdgeGeometry};
use crate::model::{EdgeId, PortDirection, PortKey};
use crate::path::{build_edge_path, EdgePath, EdgePathConfig, PathEndpoint};
use crate::state::PortRegistry;

/// Edge colors keyed by port data type.
#[derive(Debug, Clone)]
pub struct TypeColors {
    colors: HashMap<String, Color>,
    fallback: Color,
}

impl Default for TypeColors {
    fn default() -> Self {
        let colors = [
            ("STRING", Color::from_rgb_u8(100, 180, 255)),
            ("INT", Color::from_rgb_u8(120, 220, 140)),
            ("FLOAT", Color::from_rgb_u8(80, 200, 200)),
            ("BOOLEAN", Color::from_rgb_u8(240, 170, 70)),
            ("DOCUMENT", Color::from_rgb_u8(200, 140, 255)),
            ("SCHEMA", Color::from_rgb_u8(255, 120, 180)),
        ]
        .into_iter()
        .map(|(name, color)| (name.to_string(), color))
        .collect();

        Self {
            colors,
            fallback: Color::from_rgb_u8(180, 180, 180),
        }
    }
}

impl TypeColors {
    pub fn set(&mut self, data_type: impl Into<String>, color: Color) {
        self.colors.insert(data_type.into(), color);
    }

    /// Color for a port type; untyped and unknown types use the fallback.
    pub fn color_for(&self, data_type: Option<&str>) -> Color {
        data_type
            .and_then(|t| self.colors.get(t))
            .copied()
            .unwrap_or(self.fallback)
    }
}

/// A committed edge with its computed path.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedEdge {
    pub id: EdgeId,
    pub source: PortKey,
    pub target: PortKey,
    pub path: EdgePath,
    pub color: Color,
}

impl EdgeGeometry for ComputedEdge {
    fn id(&self) -> &EdgeId {
        &self.id
    }
    fn path(&self) -> &EdgePath {
        &self.path
    }
}

/// Internal trait for auto-syncing to Slint models.
trait ModelSyncer {
    fn sync(&self, edges: &[ComputedEdge], line_width: f32);
}

/// Concrete implementation of ModelSyncer for a specific path type.
struct ConcreteModelSyncer<P, F> {
    model: Rc<VecModel<P>>,
    constructor: F,
}

impl<P, F> ModelSyncer for ConcreteModelSyncer<P, F>
where
    P: Clone + 'static,
    F: Fn(SharedString, SharedString, Color, f32) -> P,
{
    fn sync(&self, edges: &[ComputedEdge], line_width: f32) {
        // Update existing rows or add new ones
        for (i, edge) in edges.iter().enumerate() {
            let item = (self.constructor)(
                SharedString::from(edge.id.as_str()),
                SharedString::from(edge.path.to_svg()),
                edge.color,
                line_width,
            );
            if i < self.model.row_count() {
                self.model.set_row_data(i, item);
            } else {
                self.model.push(item);
            }
        }
        // Remove excess rows
        while self.model.row_count() > edges.len() {
            self.model.remove(self.model.row_count() - 1);
        }
    }
}

/// Computes and holds the screen-space paths of every edge plus the
/// in-progress connection preview.
pub struct EdgePathManager {
    computed: Vec<ComputedEdge>,
    preview: Option<EdgePath>,
    colors: TypeColors,
    line_width: f32,
    /// Optional auto-sync to Slint model
    syncer: Option<Box<dyn ModelSyncer>>,
}

impl Default for EdgePathManager {
    fn default() -> Self {
        Self {
            computed: Vec::new(),
            preview: None,
            colors: TypeColors::default(),
            line_width: 2.0,
            syncer: None,
        }
    }
}

impl std::fmt::Debug for EdgePathManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgePathManager")
            .field("computed", &self.computed.len())
            .field("preview", &self.preview.is_some())
            .field("bound", &self.syncer.is_some())
            .finish()
    }
}

impl EdgePathManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to a Slint model for automatic synchronization.
    ///
    /// After binding, every call to [`update`](Self::update) also updates the model.
    ///
    /// # Arguments
    ///
    /// * `model` - The VecModel to sync to
    /// * `constructor` - Builds a row from (edge id, SVG path commands, color, line width)
    pub fn bind_model<P, F>(&mut self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(SharedString, SharedString, Color, f32) -> P + 'static,
    {
        let syncer = ConcreteModelSyncer { model, constructor };
        syncer.sync(&self.computed, self.line_width);
        self.syncer = Some(Box::new(syncer));
    }

    pub fn colors_mut(&mut self) -> &mut TypeColors {
        &mut self.colors
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    /// Recompute every committed edge path from the registry.
    ///
    /// Call after the registry was rebuilt. Edges whose ports are missing from
    /// the registry are not drawn.
    pub fn update(&mut self, graph: &WorkflowGraph, registry: &PortRegistry, config: &EdgePathConfig) {
        self.computed.clear();

        for edge in graph.edges() {
            let source = PortKey::from(&edge.source);
            let target = PortKey::from(&edge.target);
            let (Some(source_pos), Some(target_pos)) = (registry.position(&source), registry.position(&target))
            else {
                trace!("edge {} has no rendered ports", edge.id);
                continue;
            };

            let path = build_edge_path(
                &PathEndpoint::port(source_pos, PortDirection::Output, is_expanded(graph, &source)),
                &PathEndpoint::port(target_pos, PortDirection::Input, is_expanded(graph, &target)),
                config,
            );
            let color = self
                .colors
                .color_for(graph.port(&source).and_then(|p| p.data_type.as_deref()));

            self.computed.push(ComputedEdge {
                id: edge.id.clone(),
                source,
                target,
                path,
                color,
            });
        }

        if let Some(syncer) = &self.syncer {
            syncer.sync(&self.computed, self.line_width);
        }
    }

    /// Recompute the preview path for an in-progress connection.
    ///
    /// The free end follows the pointer until a snap target is found, after
    /// which it attaches to that port.
    pub fn update_preview(
        &mut self,
        preview: Option<&EdgePreview>,
        graph: &WorkflowGraph,
        registry: &PortRegistry,
        config: &EdgePathConfig,
    ) {
        self.preview = preview.map(|preview| {
            let fixed = PathEndpoint::port(
                preview.start_pos,
                preview.origin.direction,
                is_expanded(graph, &preview.origin),
            );
            let moving = match preview
                .snap_target
                .as_ref()
                .and_then(|key| registry.position(key).map(|pos| (key, pos)))
            {
                Some((key, pos)) => PathEndpoint::port(pos, key.direction, is_expanded(graph, key)),
                None => PathEndpoint::free(preview.target_pos),
            };

            match preview.origin.direction {
                PortDirection::Output => build_edge_path(&fixed, &moving, config),
                PortDirection::Input => build_edge_path(&moving, &fixed, config),
            }
        });
    }

    pub fn paths(&self) -> &[ComputedEdge] {
        &self.computed
    }

    pub fn get(&self, id: &EdgeId) -> Option<&ComputedEdge> {
        self.computed.iter().find(|e| &e.id == id)
    }

    /// SVG path of one edge, empty if the edge is not drawn.
    pub fn svg(&self, id: &EdgeId) -> String {
        self.get(id).map(|e| e.path.to_svg()).unwrap_or_default()
    }

    pub fn preview(&self) -> Option<&EdgePath> {
        self.preview.as_ref()
    }

    pub fn preview_svg(&self) -> String {
        self.preview.as_ref().map(EdgePath::to_svg).unwrap_or_default()
    }

    /// Edge under a screen-space point.
    pub fn find_edge_at(
        &self,
        pointer: crate::geometry::Point,
        hit_distance: f32,
        hit_samples: usize,
    ) -> Option<EdgeId> {
        find_edge_at(pointer, &self.computed, hit_distance, hit_samples)
    }

    pub fn len(&self) -> usize {
        self.computed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.computed.is_empty()
    }

    pub fn clear(&mut self) {
        self.computed.clear();
        self.preview = None;
        if let Some(syncer) = &self.syncer {
            syncer.sync(&self.computed, self.line_width);
        }
    }
}

fn is_expanded(graph: &WorkflowGraph, key: &PortKey) -> bool {
    graph.node(&key.node_id).map(|n| n.is_expanded).unwrap_or(true)
}
