//! Editor configuration.
//!
//! Every tunable of the engine lives here and is passed in explicitly; there
//! are no process-wide settings. All sections deserialize with defaults, so a
//! partial JSON document only overrides the fields it names.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::Point;
use crate::model::{Node, PortDirection};
use crate::path::EdgePathConfig;

/// What happens when a second edge is connected to a single-connection input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPolicy {
    /// The existing edge is removed and the new one takes its place
    #[default]
    Replace,
    /// The connection fails with `ConnectError::InputAlreadyConnected`
    Refuse,
}

/// Default node box dimensions in world units, used when a renderer does not
/// report port offsets itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMetrics {
    pub width: f32,
    pub header_height: f32,
    /// Vertical distance between two port rows
    pub port_spacing: f32,
    pub parameter_height: f32,
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self {
            width: 240.0,
            header_height: 40.0,
            port_spacing: 24.0,
            parameter_height: 32.0,
        }
    }
}

impl NodeMetrics {
    /// Offset of a port relative to its node's origin.
    ///
    /// Expanded nodes get one row per port below the header, inputs on the left
    /// edge and outputs on the right edge. Collapsed nodes pin every port to the
    /// header midline.
    pub fn port_offset(&self, index: usize, direction: PortDirection, expanded: bool) -> Point {
        let x = match direction {
            PortDirection::Input => 0.0,
            PortDirection::Output => self.width,
        };
        let y = if expanded {
            self.header_height + self.port_spacing * (index as f32 + 0.5)
        } else {
            self.header_height / 2.0
        };
        Point::new(x, y)
    }

    /// World-space size of a node's box.
    pub fn node_size(&self, node: &Node) -> (f32, f32) {
        if !node.is_expanded {
            return (self.width, self.header_height);
        }
        let rows = node.data.inputs.len().max(node.data.outputs.len());
        let height = self.header_height
            + rows as f32 * self.port_spacing
            + node.data.parameters.len() as f32 * self.parameter_height;
        (self.width, height)
    }
}

/// Where batch-added nodes land.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridPlacement {
    pub max_cols: usize,
    pub spacing_x: f32,
    pub spacing_y: f32,
    pub start: Point,
}

impl Default for GridPlacement {
    fn default() -> Self {
        Self {
            max_cols: 4,
            spacing_x: 300.0,
            spacing_y: 220.0,
            start: Point::new(100.0, 100.0),
        }
    }
}

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snap radius in screen pixels
    pub snap_distance: f32,
    /// A gesture shorter than this (and shorter than `click_max_distance`) is a click
    pub click_max_duration_ms: u64,
    pub click_max_distance: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Zoom factor applied per wheel notch
    pub wheel_zoom_step: f32,
    /// Pointer-to-curve distance (screen pixels) that counts as hitting an edge
    pub edge_hit_distance: f32,
    pub edge_hit_samples: usize,
    pub input_policy: InputPolicy,
    pub node_metrics: NodeMetrics,
    pub grid: GridPlacement,
    pub edge_path: EdgePathConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_distance: 40.0,
            click_max_duration_ms: 200,
            click_max_distance: 5.0,
            min_zoom: 0.1,
            max_zoom: 4.0,
            wheel_zoom_step: 1.1,
            edge_hit_distance: 8.0,
            edge_hit_samples: 20,
            input_policy: InputPolicy::default(),
            node_metrics: NodeMetrics::default(),
            grid: GridPlacement::default(),
            edge_path: EdgePathConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
