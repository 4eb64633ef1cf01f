//! Shape definitions and narrow-phase geometry
//!
//! # Architecture
//!
//! - **Local Space Storage**: shapes are authored relative to their owner
//! - **Per-Step Transformation**: world-space vertices and AABBs are rebuilt
//!   from the owner's transform once per step, never during a test
//! - **Pure Tests**: intersection functions work on world-space points only
//!
//! # Module Organization
//!
//! - [`intersection`] - Point/segment/polygon/circle predicates
//! - [`aabb`] - Axis-aligned bounding rectangles
//! - [`shape`] - Host-facing shapes and the registered [`Collider`]

pub mod intersection;
pub mod aabb;
pub mod shape;

pub use aabb::Aabb;
pub use shape::{Collider, CollisionShape, ShapeClass, ShapeError, WorldSpaceShape};
