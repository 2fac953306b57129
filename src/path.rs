//! Edge path geometry.
//!
//! Every edge is drawn as `stub → cubic bezier → stub`. Stubs are short straight
//! segments along each port's orientation (outputs point right, inputs point
//! left) that keep the curve clear of the node header; the bezier control
//! points are derived from clamped horizontal/vertical offsets so the curve
//! stays readable whatever the relative placement of the two nodes.

use serde::{Deserialize, Serialize};

use crate::geometry::{clamp, Point};
use crate::model::PortDirection;

/// Fixed orientation of a path endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOrientation {
    /// Output port, leaves towards +x
    Output,
    /// Input port, arrives from -x
    Input,
    /// Free point (pointer during a connection preview), no fixed orientation
    Free,
}

impl PortOrientation {
    fn sign(self) -> Option<f32> {
        match self {
            Self::Output => Some(1.0),
            Self::Input => Some(-1.0),
            Self::Free => None,
        }
    }
}

impl From<PortDirection> for PortOrientation {
    fn from(direction: PortDirection) -> Self {
        match direction {
            PortDirection::Output => Self::Output,
            PortDirection::Input => Self::Input,
        }
    }
}

/// One end of a path: a screen position plus the visual state of its node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathEndpoint {
    pub position: Point,
    pub orientation: PortOrientation,
    /// Whether the owning node is drawn expanded
    pub expanded: bool,
}

impl PathEndpoint {
    pub fn port(position: Point, direction: PortDirection, expanded: bool) -> Self {
        Self {
            position,
            orientation: direction.into(),
            expanded,
        }
    }

    /// A free point such as the pointer position while drawing an edge.
    pub fn free(position: Point) -> Self {
        Self {
            position,
            orientation: PortOrientation::Free,
            expanded: false,
        }
    }
}

/// Horizontal control-offset parameters for one visual state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParams {
    pub ratio: f32,
    pub min_horizontal: f32,
    pub max_horizontal: f32,
}

/// Tunable constants of the edge path algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgePathConfig {
    /// Stub length for ports on expanded nodes
    pub expanded_stub: f32,
    /// Stub length for ports on collapsed nodes
    pub collapsed_stub: f32,
    /// Used when either endpoint's node is expanded
    pub expanded: CurveParams,
    pub collapsed: CurveParams,
    pub vertical_ratio: f32,
    pub min_vertical: f32,
    pub max_vertical: f32,
    /// Below this horizontal distance the ports count as stacked
    pub near_vertical_threshold: f32,
    /// Minimum horizontal offset for stacked ports
    pub near_vertical_boost: f32,
    /// Added to |dy| when recomputing the vertical offset for stacked ports
    pub near_vertical_inflation: f32,
}

impl Default for EdgePathConfig {
    fn default() -> Self {
        Self {
            expanded_stub: 20.0,
            collapsed_stub: 0.0,
            expanded: CurveParams {
                ratio: 0.25,
                min_horizontal: 60.0,
                max_horizontal: 220.0,
            },
            collapsed: CurveParams {
                ratio: 0.5,
                min_horizontal: 30.0,
                max_horizontal: 180.0,
            },
            vertical_ratio: 0.125,
            min_vertical: 0.0,
            max_vertical: 60.0,
            near_vertical_threshold: 40.0,
            near_vertical_boost: 90.0,
            near_vertical_inflation: 120.0,
        }
    }
}

impl EdgePathConfig {
    /// The same curve with every length multiplied by `factor` (the zoom), so
    /// stubs and offsets keep their size relative to the nodes. Ratios are
    /// unchanged.
    pub fn scaled(&self, factor: f32) -> Self {
        let curve = |p: CurveParams| CurveParams {
            ratio: p.ratio,
            min_horizontal: p.min_horizontal * factor,
            max_horizontal: p.max_horizontal * factor,
        };
        Self {
            expanded_stub: self.expanded_stub * factor,
            collapsed_stub: self.collapsed_stub * factor,
            expanded: curve(self.expanded),
            collapsed: curve(self.collapsed),
            vertical_ratio: self.vertical_ratio,
            min_vertical: self.min_vertical * factor,
            max_vertical: self.max_vertical * factor,
            near_vertical_threshold: self.near_vertical_threshold * factor,
            near_vertical_boost: self.near_vertical_boost * factor,
            near_vertical_inflation: self.near_vertical_inflation * factor,
        }
    }
}

/// A single drawing command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo { ctrl1: Point, ctrl2: Point, to: Point },
}

/// A computed edge path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgePath {
    pub commands: Vec<PathCommand>,
}

impl EdgePath {
    /// SVG path data, e.g. `"M 0 0 L 20 0 C 85 12.5 215 87.5 280 100 L 300 100"`.
    pub fn to_svg(&self) -> String {
        let mut out = String::with_capacity(self.commands.len() * 24);
        for cmd in &self.commands {
            if !out.is_empty() {
                out.push(' ');
            }
            match cmd {
                PathCommand::MoveTo(p) => out.push_str(&format!("M {} {}", p.x, p.y)),
                PathCommand::LineTo(p) => out.push_str(&format!("L {} {}", p.x, p.y)),
                PathCommand::CubicTo { ctrl1, ctrl2, to } => out.push_str(&format!(
                    "C {} {} {} {} {} {}",
                    ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y
                )),
            }
        }
        out
    }

    /// The bezier section of the path.
    pub fn curve(&self) -> Option<CubicBezier> {
        let mut current = None;
        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => current = Some(p),
                PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                    return current.map(|p0| CubicBezier {
                        p0,
                        p1: ctrl1,
                        p2: ctrl2,
                        p3: to,
                    });
                }
            }
        }
        None
    }

    /// Minimum distance from `point` to any part of the path (stubs included).
    pub fn distance_to(&self, point: Point, num_samples: usize) -> f32 {
        let mut min_dist = f32::INFINITY;
        let mut current: Option<Point> = None;

        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) => current = Some(p),
                PathCommand::LineTo(p) => {
                    if let Some(from) = current {
                        min_dist = min_dist.min(distance_to_line_segment_sq(point, from, p).sqrt());
                    }
                    current = Some(p);
                }
                PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                    if let Some(from) = current {
                        let bezier = CubicBezier {
                            p0: from,
                            p1: ctrl1,
                            p2: ctrl2,
                            p3: to,
                        };
                        min_dist = min_dist.min(distance_to_bezier(point, &bezier, num_samples));
                    }
                    current = Some(to);
                }
            }
        }

        min_dist
    }
}

fn stub_length(endpoint: &PathEndpoint, config: &EdgePathConfig) -> f32 {
    if endpoint.orientation == PortOrientation::Free {
        0.0
    } else if endpoint.expanded {
        config.expanded_stub
    } else {
        config.collapsed_stub
    }
}

fn sign_or_positive(v: f32) -> f32 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Build the path for an edge between `source` and `target`.
///
/// # Arguments
/// * `source` - Departure point (usually an output port)
/// * `target` - Arrival point (usually an input port, or the pointer)
/// * `config` - Curve constants
pub fn build_edge_path(source: &PathEndpoint, target: &PathEndpoint, config: &EdgePathConfig) -> EdgePath {
    let source_stub_len = stub_length(source, config);
    let target_stub_len = stub_length(target, config);

    let stub_source = source
        .position
        .offset(source.orientation.sign().unwrap_or(0.0) * source_stub_len, 0.0);
    let stub_target = target
        .position
        .offset(target.orientation.sign().unwrap_or(0.0) * target_stub_len, 0.0);

    let dx = stub_target.x - stub_source.x;
    let dy = stub_target.y - stub_source.y;

    let params = if source.expanded || target.expanded {
        &config.expanded
    } else {
        &config.collapsed
    };

    let mut horizontal = clamp(dx.abs() * params.ratio, params.min_horizontal, params.max_horizontal);
    let mut vertical = clamp(
        dy.abs() * config.vertical_ratio,
        config.min_vertical,
        config.max_vertical,
    );

    // Stacked ports: force a visible loop instead of a flat vertical line
    let direction = if dx.abs() < config.near_vertical_threshold {
        horizontal = horizontal.max(config.near_vertical_boost);
        vertical = clamp(
            (dy.abs() + config.near_vertical_inflation) * config.vertical_ratio,
            config.min_vertical,
            config.max_vertical,
        );
        sign_or_positive(target.position.y - source.position.y)
    } else {
        sign_or_positive(dy)
    };

    let fallback = sign_or_positive(dx);
    let departure = source.orientation.sign().unwrap_or(fallback);
    let arrival = target.orientation.sign().unwrap_or(-fallback);

    let ctrl1 = stub_source.offset(horizontal * departure, vertical * direction);
    let ctrl2 = stub_target.offset(horizontal * arrival, -vertical * direction);

    let mut commands = Vec::with_capacity(4);
    commands.push(PathCommand::MoveTo(source.position));
    if source_stub_len > 0.0 {
        commands.push(PathCommand::LineTo(stub_source));
    }
    commands.push(PathCommand::CubicTo {
        ctrl1,
        ctrl2,
        to: stub_target,
    });
    if target_stub_len > 0.0 {
        commands.push(PathCommand::LineTo(target.position));
    }

    EdgePath { commands }
}

/// Cubic bezier curve for evaluation and distance calculations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub p0: Point, // Start point
    pub p1: Point, // Control point 1
    pub p2: Point, // Control point 2
    pub p3: Point, // End point
}

impl CubicBezier {
    /// Evaluate the bezier curve at parameter t (0.0 to 1.0)
    pub fn eval(&self, t: f32) -> Point {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * self.p0.x + 3.0 * mt2 * t * self.p1.x + 3.0 * mt * t2 * self.p2.x + t3 * self.p3.x;
        let y = mt3 * self.p0.y + 3.0 * mt2 * t * self.p1.y + 3.0 * mt * t2 * self.p2.y + t3 * self.p3.y;

        Point::new(x, y)
    }
}

/// Calculate squared distance from a point to a line segment
fn distance_to_line_segment_sq(point: Point, a: Point, b: Point) -> f32 {
    let ab = b.sub(a);
    let ap = point.sub(a);

    let ab_len_sq = ab.x * ab.x + ab.y * ab.y;

    if ab_len_sq < f32::EPSILON {
        // Degenerate segment (a == b)
        return ap.x * ap.x + ap.y * ap.y;
    }

    // Project point onto line, clamped to segment
    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len_sq).clamp(0.0, 1.0);
    let closest = a.add(ab.scale(t));

    let dx = point.x - closest.x;
    let dy = point.y - closest.y;
    dx * dx + dy * dy
}

/// Calculate the minimum distance from a point to a cubic bezier curve
///
/// Uses subdivision approach: sample curve at regular intervals and find closest point.
///
/// # Arguments
/// * `point` - The point to measure distance from
/// * `bezier` - The bezier curve
/// * `num_samples` - Number of samples for distance calculation (default: 20)
pub fn distance_to_bezier(point: Point, bezier: &CubicBezier, num_samples: usize) -> f32 {
    let num_samples = if num_samples == 0 { 20 } else { num_samples };

    let mut min_dist_sq = f32::MAX;
    let mut prev_point = bezier.eval(0.0);

    for i in 1..=num_samples {
        let t = i as f32 / num_samples as f32;
        let curr_point = bezier.eval(t);

        let dist_sq = distance_to_line_segment_sq(point, prev_point, curr_point);
        if dist_sq < min_dist_sq {
            min_dist_sq = dist_sq;
        }

        prev_point = curr_point;
    }

    min_dist_sq.sqrt()
}
