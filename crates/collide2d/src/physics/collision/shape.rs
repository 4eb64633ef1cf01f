//! Collision shapes and their per-step world-space cache
//!
//! A [`CollisionShape`] is the local-space definition authored by the host
//! (box, circle or polygon, plus an offset from the owner's origin). Once
//! registered it is wrapped in a [`Collider`], which owns the world-space
//! geometry and AABB recomputed from the owner's transform every step.

use crate::foundation::math::{Point2, Transform2D, Vec2};
use crate::scene::Entity;
use super::aabb::Aabb;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a shape definition
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// Flat polygon coordinates must come in (x, y) pairs
    #[error("polygon coordinate list has odd length {0}")]
    OddCoordinateCount(usize),

    /// A dimension, offset or vertex is NaN or infinite
    #[error("shape contains a non-finite value")]
    NonFinite,

    /// Width, height or radius below zero
    #[error("{what} must not be negative (got {value})")]
    NegativeDimension {
        /// Which dimension was rejected
        what: &'static str,
        /// The rejected value
        value: f32,
    },
}

/// Broad shape category used to pick a narrow-phase test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeClass {
    /// Box or polygon: tested through its world-space vertex list
    PolygonLike,
    /// Circle: tested through its world-space center and radius
    Circle,
}

/// Local-space shape definition (the descriptor a host attaches to an object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollisionShape {
    /// Rectangle centered on `offset`
    Box {
        /// Full width
        width: f32,
        /// Full height
        height: f32,
        /// Center relative to the owner's origin
        #[serde(default)]
        offset: Vec2,
    },
    /// Circle centered on `offset`
    Circle {
        /// Radius before owner scaling
        radius: f32,
        /// Center relative to the owner's origin
        #[serde(default)]
        offset: Vec2,
    },
    /// Closed polygon; `offset` is added to every vertex
    Polygon {
        /// Ordered vertices
        points: Vec<Point2>,
        /// Shift applied to every vertex
        #[serde(default)]
        offset: Vec2,
    },
}

impl CollisionShape {
    /// Axis-aligned rectangle centered on the owner's origin
    pub fn rect(width: f32, height: f32) -> Self {
        Self::Box { width, height, offset: Vec2::zeros() }
    }

    /// Circle centered on the owner's origin
    pub fn circle(radius: f32) -> Self {
        Self::Circle { radius, offset: Vec2::zeros() }
    }

    /// Polygon from ordered local-space vertices
    pub fn polygon(points: Vec<Point2>) -> Self {
        Self::Polygon { points, offset: Vec2::zeros() }
    }

    /// Polygon from a flat `[x0, y0, x1, y1, ...]` coordinate list
    pub fn polygon_from_coords(coords: &[f32]) -> Result<Self, ShapeError> {
        if coords.len() % 2 != 0 {
            return Err(ShapeError::OddCoordinateCount(coords.len()));
        }
        let points = coords
            .chunks_exact(2)
            .map(|pair| Point2::new(pair[0], pair[1]))
            .collect();
        Ok(Self::polygon(points))
    }

    /// Replace the local offset (builder pattern)
    #[must_use]
    pub fn with_offset(mut self, new_offset: Vec2) -> Self {
        match &mut self {
            Self::Box { offset, .. }
            | Self::Circle { offset, .. }
            | Self::Polygon { offset, .. } => {
                *offset = new_offset;
            }
        }
        self
    }

    /// Local offset from the owner's origin
    pub fn offset(&self) -> Vec2 {
        match self {
            Self::Box { offset, .. }
            | Self::Circle { offset, .. }
            | Self::Polygon { offset, .. } => *offset,
        }
    }

    /// Reject non-finite values and negative dimensions
    pub fn validate(&self) -> Result<(), ShapeError> {
        let offset = self.offset();
        if !offset.x.is_finite() || !offset.y.is_finite() {
            return Err(ShapeError::NonFinite);
        }

        match self {
            Self::Box { width, height, .. } => {
                check_dimension("width", *width)?;
                check_dimension("height", *height)
            }
            Self::Circle { radius, .. } => check_dimension("radius", *radius),
            Self::Polygon { points, .. } => {
                if points.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
                    Ok(())
                } else {
                    Err(ShapeError::NonFinite)
                }
            }
        }
    }

    /// Category used for pair classification
    ///
    /// Shapes that fail [`validate`](Self::validate) and polygons with fewer
    /// than three vertices have no class; pairs that include them never
    /// collide.
    pub fn class(&self) -> Option<ShapeClass> {
        if self.validate().is_err() {
            return None;
        }
        match self {
            Self::Box { .. } => Some(ShapeClass::PolygonLike),
            Self::Circle { .. } => Some(ShapeClass::Circle),
            Self::Polygon { points, .. } if points.len() >= 3 => Some(ShapeClass::PolygonLike),
            Self::Polygon { .. } => None,
        }
    }

    /// Build the world-space geometry for an owner placed at `transform`
    ///
    /// `reuse` is the previous frame's geometry; its vertex buffer is recycled
    /// when the variant matches.
    fn to_world_space(
        &self,
        transform: &Transform2D,
        reuse: Option<WorldSpaceShape>,
    ) -> WorldSpaceShape {
        let matrix = transform.to_matrix();
        match self {
            Self::Circle { radius, offset } => WorldSpaceShape::Circle {
                center: matrix.transform_point(&Point2::from(*offset)),
                radius: radius * transform.uniform_scale(),
            },
            Self::Box { width, height, offset } => {
                let (hw, hh) = (width * 0.5, height * 0.5);
                let corners = [
                    Point2::new(offset.x - hw, offset.y - hh),
                    Point2::new(offset.x - hw, offset.y + hh),
                    Point2::new(offset.x + hw, offset.y + hh),
                    Point2::new(offset.x + hw, offset.y - hh),
                ];
                let mut points = recycle_points(reuse, corners.len());
                points.extend(corners.iter().map(|p| matrix.transform_point(p)));
                WorldSpaceShape::Polygon(points)
            }
            Self::Polygon { points: local, offset } => {
                let mut points = recycle_points(reuse, local.len());
                points.extend(local.iter().map(|p| matrix.transform_point(&(p + offset))));
                WorldSpaceShape::Polygon(points)
            }
        }
    }
}

fn check_dimension(what: &'static str, value: f32) -> Result<(), ShapeError> {
    if !value.is_finite() {
        Err(ShapeError::NonFinite)
    } else if value < 0.0 {
        Err(ShapeError::NegativeDimension { what, value })
    } else {
        Ok(())
    }
}

fn recycle_points(reuse: Option<WorldSpaceShape>, capacity: usize) -> Vec<Point2> {
    match reuse {
        Some(WorldSpaceShape::Polygon(mut points)) => {
            points.clear();
            points
        }
        _ => Vec::with_capacity(capacity),
    }
}

/// World-space geometry of one shape for the current step
#[derive(Debug, Clone, PartialEq)]
pub enum WorldSpaceShape {
    /// Transformed vertices of a box or polygon
    Polygon(Vec<Point2>),
    /// Transformed center and scaled radius of a circle
    Circle {
        /// World-space center
        center: Point2,
        /// World-space radius
        radius: f32,
    },
}

impl WorldSpaceShape {
    /// Bounding box of this geometry
    ///
    /// An empty vertex list has no extent; it collapses to a zero-sized box
    /// at `fallback`.
    pub fn aabb(&self, fallback: &Point2) -> Aabb {
        match self {
            Self::Polygon(points) => Aabb::from_points(points)
                .unwrap_or_else(|| Aabb::new(fallback.x, fallback.y, 0.0, 0.0)),
            Self::Circle { center, radius } => Aabb::from_circle(center, *radius),
        }
    }
}

/// A registered shape: its definition, owner, and cached world geometry
#[derive(Debug, Clone)]
pub struct Collider {
    owner: Entity,
    shape: CollisionShape,
    class: Option<ShapeClass>,
    registration_index: u64,
    world: Option<WorldSpaceShape>,
    aabb: Aabb,
    previous_aabb: Aabb,
}

impl Collider {
    /// Wrap a shape definition; world geometry stays empty until the first refresh
    pub fn new(owner: Entity, shape: CollisionShape, registration_index: u64) -> Self {
        let class = shape.class();
        Self {
            owner,
            shape,
            class,
            registration_index,
            world: None,
            aabb: Aabb::default(),
            previous_aabb: Aabb::default(),
        }
    }

    /// Recompute world geometry and AABB from the owner's transform
    ///
    /// A missing or non-finite transform leaves the cached geometry untouched
    /// and returns `false`.
    pub fn refresh(&mut self, transform: Option<&Transform2D>) -> bool {
        let Some(transform) = transform.filter(|t| t.is_finite()) else {
            log::trace!(
                "Collider of {:?}: no usable transform, keeping stale geometry",
                self.owner
            );
            return false;
        };

        let world = self.shape.to_world_space(transform, self.world.take());
        self.previous_aabb = self.aabb;
        self.aabb = world.aabb(&Point2::from(transform.position));
        self.world = Some(world);
        true
    }

    /// Object that owns this shape
    pub fn owner(&self) -> Entity {
        self.owner
    }

    /// Local-space definition
    pub fn shape(&self) -> &CollisionShape {
        &self.shape
    }

    /// Classification category, `None` for malformed shapes
    pub fn class(&self) -> Option<ShapeClass> {
        self.class
    }

    /// Order in which the shape was registered (lower registered earlier)
    pub fn registration_index(&self) -> u64 {
        self.registration_index
    }

    /// World geometry from the last successful refresh
    pub fn world(&self) -> Option<&WorldSpaceShape> {
        self.world.as_ref()
    }

    /// World vertices for boxes and polygons
    pub fn world_points(&self) -> Option<&[Point2]> {
        match &self.world {
            Some(WorldSpaceShape::Polygon(points)) => Some(points),
            _ => None,
        }
    }

    /// World center and radius for circles
    pub fn world_circle(&self) -> Option<(Point2, f32)> {
        match &self.world {
            Some(WorldSpaceShape::Circle { center, radius }) => Some((*center, *radius)),
            _ => None,
        }
    }

    /// Current AABB
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// AABB from the refresh before the last one
    pub fn previous_aabb(&self) -> &Aabb {
        &self.previous_aabb
    }
}
