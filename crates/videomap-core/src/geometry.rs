//! Geometry primitives derived from polygon vertices
//!
//! A polygon owns an ordered vertex list; everything in this module is
//! recomputed from that list whenever it changes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width, never negative
    pub width: f32,
    /// Height, never negative
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding box over a point sequence.
    ///
    /// Returns a zero-sized rectangle at the origin for an empty sequence.
    pub fn from_points(points: &[Vec2]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };

        let (min, max) = points
            .iter()
            .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));

        Self {
            x: min.x,
            y: min.y,
            width: (max.x - min.x).max(0.0),
            height: (max.y - min.y).max(0.0),
        }
    }

    /// Top-left corner
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Bottom-right corner
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    /// Width and height as a vector
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// True when the rectangle covers no area
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Pixel dimensions of a raster covering this rectangle: `ceil(w) x ceil(h)`, at least 1x1
    pub fn pixel_size(&self) -> (u32, u32) {
        let width = self.width.ceil().max(1.0) as u32;
        let height = self.height.ceil().max(1.0) as u32;
        (width, height)
    }

    /// Smallest rectangle with whole-pixel corners that contains this one
    pub fn pixel_snapped(&self) -> Rect {
        let min = self.origin().floor();
        let max = self.max().ceil();
        Rect {
            x: min.x,
            y: min.y,
            width: max.x - min.x,
            height: max.y - min.y,
        }
    }
}

/// Fill rule used to decide the inside of self-intersecting paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRule {
    /// Inside if a ray crosses the outline an odd number of times
    #[default]
    EvenOdd,
    /// Inside if the winding number is non-zero
    NonZero,
}

/// Closed, filled outline through a polygon's points in insertion order
///
/// No convexity requirement: self-intersecting outlines are valid and their
/// inside is decided by a [`FillRule`] at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPath {
    points: Vec<Vec2>,
}

impl ClipPath {
    /// Build a clip path, or `None` when fewer than 3 points are given
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        Some(Self {
            points: points.to_vec(),
        })
    }

    /// Vertices in visiting order
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; a clip path has at least 3 vertices
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Clip paths are always closed
    pub fn is_closed(&self) -> bool {
        true
    }

    /// Edges including the closing edge from the last point back to the first
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Same outline shifted by `offset`
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            points: self.points.iter().map(|p| *p + offset).collect(),
        }
    }

    /// Point-in-path test under the given fill rule
    pub fn contains(&self, point: Vec2, rule: FillRule) -> bool {
        let mut winding = 0i32;
        let mut crossings = 0u32;

        for (a, b) in self.edges() {
            if a.y <= point.y {
                if b.y > point.y && cross(a, b, point) > 0.0 {
                    winding += 1;
                    crossings += 1;
                }
            } else if b.y <= point.y && cross(a, b, point) < 0.0 {
                winding -= 1;
                crossings += 1;
            }
        }

        match rule {
            FillRule::EvenOdd => crossings % 2 == 1,
            FillRule::NonZero => winding != 0,
        }
    }
}

/// Z component of `(b - a) x (p - a)`; positive when `p` is left of `a -> b`
fn cross(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y)
}
