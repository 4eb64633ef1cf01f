//! Physics module for 2D collision detection
//!
//! Shapes registered with a [`CollisionRegistry`] are paired with every other
//! live shape. Each step the registry refreshes world-space geometry, tests
//! every pair, and reports ENTER/STAY/EXIT transitions to the owners.

pub mod collision;
pub mod collision_layers;
pub mod collision_system;
pub mod contact;

pub use collision::{Aabb, Collider, CollisionShape, ShapeClass, ShapeError, WorldSpaceShape};
pub use collision_layers::CollisionMatrix;
pub use collision_system::{
    CollisionRegistry, DeferredChange, DeferredChanges, PairFilter, StepStats,
};
pub use contact::{Contact, ContactKind, ContactSignal};
