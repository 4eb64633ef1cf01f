//! Math utilities and types
//!
//! Provides the 2D math types shared by the geometry, shape and registry
//! modules. Everything is `f32`, matching the host simulation.

pub use nalgebra::{Matrix3, Rotation2, Vector2};
use serde::{Deserialize, Serialize};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 2D point type
pub type Point2 = nalgebra::Point2<f32>;

/// 3x3 homogeneous matrix type for 2D affine transforms
pub type Mat3 = Matrix3<f32>;

/// World placement of a shape-owning object: position, rotation and scale
///
/// Supplied fresh every step by the host scene graph. Rotation is in radians,
/// counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    /// Position in world space
    pub position: Vec2,

    /// Rotation angle in radians
    pub rotation: f32,

    /// Per-axis scale factors
    pub scale: Vec2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Transform2D {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec2, rotation: f32) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Replace the scale (builder pattern)
    #[must_use]
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Convert to a homogeneous transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat3 {
        Mat3::new_translation(&self.position)
            * Mat3::new_rotation(self.rotation)
            * Mat3::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point2) -> Point2 {
        self.to_matrix().transform_point(&point)
    }

    /// Scale factor applied to lengths that must stay isotropic (circle radii)
    ///
    /// Uses the largest absolute axis scale so that a scaled circle never
    /// shrinks below the area its owner covers.
    pub fn uniform_scale(&self) -> f32 {
        self.scale.x.abs().max(self.scale.y.abs())
    }

    /// Combine this (parent) transform with a child transform
    pub fn combine(&self, child: &Transform2D) -> Transform2D {
        let rotation = Rotation2::new(self.rotation);
        Transform2D {
            position: self.position + rotation * self.scale.component_mul(&child.position),
            rotation: self.rotation + child.rotation,
            scale: self.scale.component_mul(&child.scale),
        }
    }

    /// True when every component is a finite number
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.rotation.is_finite()
            && self.scale.iter().all(|v| v.is_finite())
    }
}
