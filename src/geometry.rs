//! Coordinate spaces and small geometric helpers.
//!
//! Node positions live in **world space**. The canvas content layer is drawn
//! with the camera transform `screen = container_origin + pan + world * scale`,
//! and everything in this module is written against that single convention.

use serde::{Deserialize, Serialize};

/// A 2D point (or vector) in either world or screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn sub(self, other: Point) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    pub fn add(self, other: Point) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Axis-aligned rectangle (x, y = top-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Build a normalized rect from two corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Strict overlap test; rects that only touch along an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// Camera transform: pan offset in screen pixels plus zoom factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, scale: 1.0 }
    }
}

impl Viewport {
    pub const fn new(x: f32, y: f32, scale: f32) -> Self {
        Self { x, y, scale }
    }

    /// Scale used for division; a non-positive zoom behaves like 1.0.
    pub fn effective_scale(&self) -> f32 {
        if self.scale > 0.0 {
            self.scale
        } else {
            1.0
        }
    }

    /// Pan by a screen-space delta.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Multiply the zoom by `factor`, keeping the world point under
    /// `screen_point` fixed. The resulting scale is clamped to `[min, max]`.
    pub fn zoom_at(&mut self, screen_point: Point, container: &Rect, factor: f32, min: f32, max: f32) {
        let anchor = screen_to_world(screen_point, container, self);
        self.scale = clamp(self.effective_scale() * factor, min, max);
        // Re-derive pan so that world_to_screen(anchor) == screen_point.
        self.x = screen_point.x - container.x - anchor.x * self.scale;
        self.y = screen_point.y - container.y - anchor.y * self.scale;
    }
}

/// Convert a world-space point to screen (client) coordinates.
pub fn world_to_screen(world: Point, container: &Rect, view: &Viewport) -> Point {
    let scale = view.effective_scale();
    Point::new(
        container.x + view.x + world.x * scale,
        container.y + view.y + world.y * scale,
    )
}

/// Convert a screen (client) position to world space.
///
/// Exact inverse of [`world_to_screen`]: `(client - container_origin - pan) / scale`.
pub fn screen_to_world(client: Point, container: &Rect, view: &Viewport) -> Point {
    let scale = view.effective_scale();
    Point::new(
        (client.x - container.x - view.x) / scale,
        (client.y - container.y - view.y) / scale,
    )
}

/// Euclidean distance. Missing points yield `f32::INFINITY` so callers can use
/// the result directly as a "no match" sentinel in minimum searches.
pub fn distance(a: Option<Point>, b: Option<Point>) -> f32 {
    match (a, b) {
        (Some(a), Some(b)) => a.sub(b).length(),
        _ => f32::INFINITY,
    }
}

/// Clamp `v` to `[lo, hi]`. Unlike `f32::clamp` this never panics when
/// `lo > hi`; the lower bound wins.
pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    v.min(hi).max(lo)
}

/// Column and row count for laying out `total_items` in a near-square grid.
pub fn grid_dimensions(total_items: usize, max_cols: usize) -> (usize, usize) {
    if total_items == 0 {
        return (0, 0);
    }
    let max_cols = max_cols.max(1);
    let root = (total_items as f64).sqrt().ceil() as usize;
    let cols = max_cols.min(root).max(1);
    let rows = total_items.div_ceil(cols);
    (cols, rows)
}

/// Position of item `index` in a grid with `cols` columns.
pub fn grid_position(index: usize, cols: usize, start: Point, spacing_x: f32, spacing_y: f32) -> Point {
    let cols = cols.max(1);
    Point::new(
        start.x + (index % cols) as f32 * spacing_x,
        start.y + (index / cols) as f32 * spacing_y,
    )
}
