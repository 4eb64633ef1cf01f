//! Persistent shape pairs and their touching state machine
//!
//! A [`Contact`] is created once per pair of registered shapes. It decides at
//! construction which narrow-phase test applies, then every step turns the
//! boolean overlap result into an ENTER/STAY/EXIT/NONE signal.

use crate::foundation::collections::ShapeHandle;
use super::collision::intersection::{circle_circle, polygon_circle, polygon_polygon};
use super::collision::shape::{Collider, ShapeClass};

/// Narrow-phase strategy fixed for the lifetime of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKind {
    /// Both shapes are boxes or polygons
    PolygonPolygon,
    /// Both shapes are circles
    CircleCircle,
    /// The first shape is polygon-like, the second a circle
    PolygonCircle,
}

impl ContactKind {
    /// Classify a pair of shape classes
    ///
    /// Returns the kind and whether the participants must be swapped so that
    /// the polygon comes first. `None` when either shape is malformed.
    pub fn classify(
        first: Option<ShapeClass>,
        second: Option<ShapeClass>,
    ) -> Option<(Self, bool)> {
        match (first?, second?) {
            (ShapeClass::PolygonLike, ShapeClass::PolygonLike) => {
                Some((Self::PolygonPolygon, false))
            }
            (ShapeClass::Circle, ShapeClass::Circle) => Some((Self::CircleCircle, false)),
            (ShapeClass::PolygonLike, ShapeClass::Circle) => Some((Self::PolygonCircle, false)),
            (ShapeClass::Circle, ShapeClass::PolygonLike) => Some((Self::PolygonCircle, true)),
        }
    }
}

/// Per-step transition emitted by a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactSignal {
    /// Not touching before or now
    None,
    /// Started touching
    Enter,
    /// Still touching
    Stay,
    /// Stopped touching
    Exit,
}

/// Persistent binding between two registered shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    first: ShapeHandle,
    second: ShapeHandle,
    kind: Option<ContactKind>,
    touching: bool,
}

impl Contact {
    /// Bind two shapes and classify the pair
    ///
    /// A circle paired with a polygon is stored polygon-first.
    pub fn new(a: (ShapeHandle, &Collider), b: (ShapeHandle, &Collider)) -> Self {
        match ContactKind::classify(a.1.class(), b.1.class()) {
            Some((kind, true)) => Self::with_kind(b.0, a.0, Some(kind)),
            Some((kind, false)) => Self::with_kind(a.0, b.0, Some(kind)),
            None => Self::with_kind(a.0, b.0, None),
        }
    }

    fn with_kind(first: ShapeHandle, second: ShapeHandle, kind: Option<ContactKind>) -> Self {
        Self { first, second, kind, touching: false }
    }

    /// First participant (the polygon in a polygon-circle pair)
    pub fn first(&self) -> ShapeHandle {
        self.first
    }

    /// Second participant
    pub fn second(&self) -> ShapeHandle {
        self.second
    }

    /// Narrow-phase strategy, `None` for pairs that never collide
    pub fn kind(&self) -> Option<ContactKind> {
        self.kind
    }

    /// Whether the pair was touching after the last evaluation
    pub fn is_touching(&self) -> bool {
        self.touching
    }

    /// Does this contact reference `shape`?
    pub fn involves(&self, shape: ShapeHandle) -> bool {
        self.first == shape || self.second == shape
    }

    /// The participant that is not `shape`
    pub fn other(&self, shape: ShapeHandle) -> Option<ShapeHandle> {
        if self.first == shape {
            Some(self.second)
        } else if self.second == shape {
            Some(self.first)
        } else {
            None
        }
    }

    /// Overlap test: AABB rejection, then the classified narrow-phase test
    ///
    /// `first` and `second` must be the colliders behind [`first()`](Self::first)
    /// and [`second()`](Self::second). Shapes that have never been refreshed
    /// do not overlap anything.
    pub fn test(&self, first: &Collider, second: &Collider) -> bool {
        let Some(kind) = self.kind else {
            return false;
        };

        if !first.aabb().intersects(second.aabb()) {
            return false;
        }

        match kind {
            ContactKind::PolygonPolygon => match (first.world_points(), second.world_points()) {
                (Some(a), Some(b)) => polygon_polygon(a, b),
                _ => false,
            },
            ContactKind::CircleCircle => match (first.world_circle(), second.world_circle()) {
                (Some((ca, ra)), Some((cb, rb))) => circle_circle(&ca, ra, &cb, rb),
                _ => false,
            },
            ContactKind::PolygonCircle => match (first.world_points(), second.world_circle()) {
                (Some(points), Some((center, radius))) => polygon_circle(points, &center, radius),
                _ => false,
            },
        }
    }

    /// Evaluate the pair and advance the state machine
    pub fn update_state(&mut self, first: &Collider, second: &Collider) -> ContactSignal {
        let overlapping = self.test(first, second);
        self.advance(overlapping)
    }

    /// Feed one overlap result into the state machine
    pub fn advance(&mut self, overlapping: bool) -> ContactSignal {
        match (overlapping, self.touching) {
            (true, false) => {
                self.touching = true;
                ContactSignal::Enter
            }
            (true, true) => ContactSignal::Stay,
            (false, true) => {
                self.touching = false;
                ContactSignal::Exit
            }
            (false, false) => ContactSignal::None,
        }
    }
}
