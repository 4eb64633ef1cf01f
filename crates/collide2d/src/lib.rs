//! # collide2d
//!
//! Trigger-style 2D collision detection for game objects.
//!
//! ## Features
//!
//! - **Shapes**: boxes, circles and arbitrary polygons with local offsets
//! - **Narrow Phase**: exact polygon/polygon, circle/circle and polygon/circle tests
//! - **Contact Tracking**: persistent pairs reporting ENTER, STAY and EXIT
//! - **Filtering**: group collision matrix plus an optional host predicate
//! - **Configuration**: TOML or RON files through the [`config::Config`] trait
//!
//! ## Quick Start
//!
//! ```rust
//! use collide2d::prelude::*;
//!
//! let mut scene = SimpleListGraph::new();
//! let ship = scene.spawn(Transform2D::from_position(Vec2::new(0.0, 0.0)));
//! let rock = scene.spawn(Transform2D::from_position(Vec2::new(1.5, 0.0)));
//!
//! let mut registry = CollisionRegistry::default();
//! registry.register(ship, CollisionShape::rect(2.0, 2.0));
//! registry.register(rock, CollisionShape::circle(1.0));
//! registry.set_callback(ship, CollisionEventKind::Enter, |e: &CollisionEvent| {
//!     log::info!("{:?} hit {:?}", e.this_owner, e.other_owner);
//! });
//!
//! let stats = registry.step(1.0 / 60.0, &scene);
//! assert_eq!(stats.entered, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::must_use_candidate)]

pub mod foundation;
pub mod config;
pub mod scene;
pub mod events;
pub mod physics;

/// Common imports for hosts of the collision registry
pub mod prelude {
    pub use crate::config::{CollisionConfig, Config, ConfigError};
    pub use crate::events::{CollisionEvent, CollisionEventKind, CollisionHandler};
    pub use crate::foundation::collections::ShapeHandle;
    pub use crate::foundation::math::{Point2, Transform2D, Vec2};
    pub use crate::physics::{
        CollisionMatrix, CollisionRegistry, CollisionShape, DeferredChanges, ShapeError, StepStats,
    };
    pub use crate::scene::{Entity, SceneGraph, SimpleListGraph};
}
