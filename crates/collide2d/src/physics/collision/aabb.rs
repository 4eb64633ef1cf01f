//! Axis-aligned bounding rectangles for broad-phase rejection

use crate::foundation::math::{Point2, Vec2};

/// Axis-aligned bounding box stored as a minimum corner plus size
///
/// Width and height are never negative once built from geometry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    /// Minimum x coordinate
    pub x: f32,
    /// Minimum y coordinate
    pub y: f32,
    /// Extent along x
    pub width: f32,
    /// Extent along y
    pub height: f32,
}

impl Aabb {
    /// Create a new AABB from its minimum corner and size
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest AABB enclosing every point, or `None` for an empty slice
    pub fn from_points(points: &[Point2]) -> Option<Self> {
        let first = points.first()?;
        let (min, max) = points.iter().skip(1).fold((*first, *first), |(min, max), p| {
            (
                Point2::new(min.x.min(p.x), min.y.min(p.y)),
                Point2::new(max.x.max(p.x), max.y.max(p.y)),
            )
        });
        Some(Self::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    /// Square AABB of side `2 * radius` centered on `center`
    pub fn from_circle(center: &Point2, radius: f32) -> Self {
        let radius = radius.abs();
        Self::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0)
    }

    /// Minimum corner
    pub fn min(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    /// Maximum corner
    pub fn max(&self) -> Point2 {
        Point2::new(self.x + self.width, self.y + self.height)
    }

    /// Center of the box
    pub fn center(&self) -> Point2 {
        self.min() + Vec2::new(self.width, self.height) * 0.5
    }

    /// Enclosed area
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Check if this AABB intersects another AABB
    ///
    /// Both axis ranges must overlap. Boxes sharing only an edge count as
    /// overlapping so the test never rejects shapes whose boundaries touch.
    pub fn intersects(&self, other: &Aabb) -> bool {
        let (min_a, max_a) = (self.min(), self.max());
        let (min_b, max_b) = (other.min(), other.max());
        min_a.x <= max_b.x && max_a.x >= min_b.x && min_a.y <= max_b.y && max_a.y >= min_b.y
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: &Point2) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }
}
