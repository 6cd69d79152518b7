//! Core types for circuit representation.

use std::fmt;
use std::ops::{Add, Sub};

/// Size of one grid cell in layout units.
pub const GRID_SIZE: f32 = 20.0;

/// Snap a coordinate to the nearest grid line.
pub fn snap(value: f32, grid: f32) -> f32 {
    (value / grid).round() * grid
}

/// Snap a coordinate to the grid line at or below it.
pub fn snap_down(value: f32, grid: f32) -> f32 {
    (value / grid).floor() * grid
}

/// Snap a coordinate to the grid line at or above it.
pub fn snap_up(value: f32, grid: f32) -> f32 {
    (value / grid).ceil() * grid
}

/// A unique identifier for a component in a circuit.
///
/// Ids are slot indices and are never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub usize);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Index into the circuit-wide pin table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(pub usize);

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinDirection {
    Input,
    Output,
}

/// A position in layout space. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Snap both coordinates to the grid.
    pub fn snapped(self, grid: f32) -> Self {
        Self::new(snap(self.x, grid), snap(self.y, grid))
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Distance from this point to the segment `a`-`b`.
    pub fn distance_to_segment(self, a: Point, b: Point) -> f32 {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return self.distance(a);
        }
        let t = (((self.x - a.x) * dx + (self.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
        self.distance(Point::new(a.x + t * dx, a.y + t * dy))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned rectangle, `(x, y)` being the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Grow the rectangle by `margin` on every side.
    pub fn inflate(&self, margin: f32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Check if an axis-aligned segment passes through the interior.
    ///
    /// Touching an edge does not count as a crossing.
    pub fn blocks_segment(&self, a: Point, b: Point) -> bool {
        let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
        let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
        if min_y == max_y {
            min_y > self.top()
                && min_y < self.bottom()
                && max_x > self.left()
                && min_x < self.right()
        } else if min_x == max_x {
            min_x > self.left()
                && min_x < self.right()
                && max_y > self.top()
                && min_y < self.bottom()
        } else {
            // Diagonal segments only appear in hand-edited paths; use the bounding box.
            max_x > self.left()
                && min_x < self.right()
                && max_y > self.top()
                && min_y < self.bottom()
        }
    }
}
