//! Automatic node placement.
//!
//! Grid placement for batches of new nodes is always available. Hierarchical
//! (layered) arrangement of a whole graph uses the Sugiyama algorithm from the
//! `rust-sugiyama` crate and requires the `layout` feature.
//!
//! The Sugiyama API uses `f64` coordinates because `rust-sugiyama` operates in
//! `f64`; the rest of this crate uses `f32`, so results are converted with
//! `as f32` when applied to nodes.

use crate::config::GridPlacement;
use crate::geometry::{grid_dimensions, grid_position, Point};

/// World positions for `count` new nodes in a near-square grid.
pub fn grid_layout(count: usize, placement: &GridPlacement) -> Vec<Point> {
    let (cols, _) = grid_dimensions(count, placement.max_cols);
    (0..count)
        .map(|i| grid_position(i, cols, placement.start, placement.spacing_x, placement.spacing_y))
        .collect()
}

#[cfg(feature = "layout")]
pub use self::sugiyama::*;

#[cfg(feature = "layout")]
mod sugiyama {
    use std::collections::{HashMap, HashSet};

    use crate::config::NodeMetrics;
    use crate::graph::WorkflowGraph;
    use crate::model::NodeId;

    /// Layout direction for the Sugiyama algorithm.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[non_exhaustive]
    pub enum Direction {
        /// Layers flow top to bottom.
        TopToBottom,
        /// Layers flow left to right (default, matching output-right / input-left ports).
        #[default]
        LeftToRight,
    }

    /// A positioned node returned by [`sugiyama_layout`].
    #[derive(Debug, Clone, PartialEq)]
    pub struct NodePosition {
        pub id: NodeId,
        /// X coordinate of the node's top-left corner.
        pub x: f64,
        /// Y coordinate of the node's top-left corner.
        pub y: f64,
    }

    /// Configuration for the Sugiyama layout algorithm.
    #[derive(Debug, Clone, Copy, Default)]
    #[non_exhaustive]
    pub struct SugiyamaConfig {
        /// Minimum spacing between vertices (0.0 uses the `rust-sugiyama` default of 10.0).
        pub vertex_spacing: f64,
        /// Minimum edge length between layers (0 uses the `rust-sugiyama` default of 1).
        pub minimum_length: u32,
        pub dummy_vertices: bool,
        pub direction: Direction,
    }

    impl SugiyamaConfig {
        pub fn with_direction(mut self, direction: Direction) -> Self {
            self.direction = direction;
            self
        }

        pub fn with_vertex_spacing(mut self, spacing: f64) -> Self {
            self.vertex_spacing = spacing;
            self
        }
    }

    /// Compute Sugiyama hierarchical layout positions.
    ///
    /// Takes edges as `(source, target)` node pairs and node sizes as
    /// `(node_id, (width, height))` pairs. Node ids are mapped to sequential
    /// `u32` indices for `rust-sugiyama` and translated back before returning.
    ///
    /// Duplicate node ids in `node_sizes` are ignored (first occurrence wins).
    pub fn sugiyama_layout(
        edges: &[(NodeId, NodeId)],
        node_sizes: &[(NodeId, (f64, f64))],
        config: &SugiyamaConfig,
    ) -> Vec<NodePosition> {
        if node_sizes.is_empty() {
            return Vec::new();
        }

        let horizontal = config.direction == Direction::LeftToRight;

        let mut id_to_idx: HashMap<&NodeId, u32> = HashMap::new();
        let mut idx_to_id: Vec<&NodeId> = Vec::with_capacity(node_sizes.len());
        let mut vertices: Vec<(u32, (f64, f64))> = Vec::with_capacity(node_sizes.len());

        for (node_id, (w, h)) in node_sizes {
            if id_to_idx.contains_key(node_id) {
                continue;
            }
            let idx = idx_to_id.len() as u32;
            id_to_idx.insert(node_id, idx);
            idx_to_id.push(node_id);
            // Swap for horizontal layout so layers are spaced along the future x-axis
            let size = if horizontal { (*h, *w) } else { (*w, *h) };
            vertices.push((idx, size));
        }

        // Unknown nodes and self-loops are skipped, parallel edges collapsed
        let mapped_edges: Vec<(u32, u32)> = edges
            .iter()
            .filter_map(|(src, dst)| {
                let src_idx = *id_to_idx.get(src)?;
                let dst_idx = *id_to_idx.get(dst)?;
                (src_idx != dst_idx).then_some((src_idx, dst_idx))
            })
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let mut sg_config = rust_sugiyama::configure::Config {
            dummy_vertices: config.dummy_vertices,
            ..Default::default()
        };
        if config.vertex_spacing > 0.0 {
            sg_config.vertex_spacing = config.vertex_spacing;
        }
        if config.minimum_length > 0 {
            sg_config.minimum_length = config.minimum_length;
        }

        // Returns one (layout, width, height) triple per connected subgraph
        let subgraphs = rust_sugiyama::from_vertices_and_edges(&vertices, &mapped_edges, &sg_config);

        let mut results = Vec::with_capacity(idx_to_id.len());
        for (layout, _width, _height) in &subgraphs {
            for &(idx, (x, y)) in layout {
                if let Some(&node_id) = idx_to_id.get(idx) {
                    let (px, py) = if horizontal { (y, x) } else { (x, y) };
                    results.push(NodePosition {
                        id: node_id.clone(),
                        x: px,
                        y: py,
                    });
                }
            }
        }

        results
    }

    /// Sugiyama layout of a whole workflow, using `metrics` for node sizes.
    pub fn arrange_graph(graph: &WorkflowGraph, metrics: &NodeMetrics, config: &SugiyamaConfig) -> Vec<NodePosition> {
        let edges: Vec<(NodeId, NodeId)> = graph
            .edges()
            .iter()
            .map(|e| (e.source.node_id.clone(), e.target.node_id.clone()))
            .collect();
        let node_sizes: Vec<(NodeId, (f64, f64))> = graph
            .nodes()
            .iter()
            .map(|n| {
                let (w, h) = metrics.node_size(n);
                (n.id.clone(), (w as f64, h as f64))
            })
            .collect();

        sugiyama_layout(&edges, &node_sizes, config)
    }

}
