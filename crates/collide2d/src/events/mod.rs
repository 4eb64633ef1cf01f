//! Collision event delivery
//!
//! Key principles:
//! - One handler per (owner, event kind); setting a new one replaces the old
//! - Handlers receive a plain event value, never the registry itself
//! - Delivery is synchronous, inside the step that produced the transition

use crate::foundation::collections::ShapeHandle;
use crate::scene::Entity;
use std::collections::HashMap;

/// Collision transition kinds delivered to owners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionEventKind {
    /// Two shapes started overlapping this step
    Enter,
    /// Two shapes were overlapping last step and still are
    Stay,
    /// Two shapes stopped overlapping this step
    Exit,
}

/// Event handed to one owner about one of its shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    /// Transition kind
    pub kind: CollisionEventKind,
    /// Owner receiving the event
    pub this_owner: Entity,
    /// Receiving owner's shape involved in the transition
    pub this_shape: ShapeHandle,
    /// Owner of the other shape
    pub other_owner: Entity,
    /// The other shape
    pub other_shape: ShapeHandle,
}

impl CollisionEvent {
    /// The same transition as seen from the other participant
    #[must_use]
    pub fn mirrored(&self) -> Self {
        Self {
            kind: self.kind,
            this_owner: self.other_owner,
            this_shape: self.other_shape,
            other_owner: self.this_owner,
            other_shape: self.this_shape,
        }
    }
}

/// Collision callback
pub trait CollisionHandler {
    /// Handle a collision transition for the owner this handler is registered to
    fn on_collision(&mut self, event: &CollisionEvent);
}

impl<F> CollisionHandler for F
where
    F: FnMut(&CollisionEvent),
{
    fn on_collision(&mut self, event: &CollisionEvent) {
        self(event);
    }
}

/// Callback table keyed by owner and event kind
#[derive(Default)]
pub struct CollisionCallbacks {
    handlers: HashMap<(Entity, CollisionEventKind), Box<dyn CollisionHandler>>,
}

impl CollisionCallbacks {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for `owner` and `kind`
    pub fn set(
        &mut self,
        owner: Entity,
        kind: CollisionEventKind,
        handler: Box<dyn CollisionHandler>,
    ) {
        self.handlers.insert((owner, kind), handler);
    }

    /// Remove the handler for `owner` and `kind`
    pub fn remove(&mut self, owner: Entity, kind: CollisionEventKind) -> bool {
        self.handlers.remove(&(owner, kind)).is_some()
    }

    /// Remove every handler registered by `owner`
    pub fn clear_owner(&mut self, owner: Entity) {
        self.handlers.retain(|(entity, _), _| *entity != owner);
    }

    /// Does `owner` have a handler for `kind`?
    pub fn has(&self, owner: Entity, kind: CollisionEventKind) -> bool {
        self.handlers.contains_key(&(owner, kind))
    }

    /// Deliver an event to its receiving owner's handler, if any
    ///
    /// Returns whether a handler ran.
    pub fn dispatch(&mut self, event: &CollisionEvent) -> bool {
        match self.handlers.get_mut(&(event.this_owner, event.kind)) {
            Some(handler) => {
                handler.on_collision(event);
                true
            }
            None => false,
        }
    }

    /// Drop every handler
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl std::fmt::Debug for CollisionCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionCallbacks")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::ShapeMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn event(kind: CollisionEventKind) -> CollisionEvent {
        let mut shapes = ShapeMap::with_key();
        CollisionEvent {
            kind,
            this_owner: Entity::new(1),
            this_shape: shapes.insert(()),
            other_owner: Entity::new(2),
            other_shape: shapes.insert(()),
        }
    }

    #[test]
    fn test_dispatch_to_registered_handler() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&received);

        let mut callbacks = CollisionCallbacks::new();
        callbacks.set(
            Entity::new(1),
            CollisionEventKind::Enter,
            Box::new(move |e: &CollisionEvent| sink.borrow_mut().push(e.other_owner)),
        );

        assert!(callbacks.dispatch(&event(CollisionEventKind::Enter)));
        assert!(!callbacks.dispatch(&event(CollisionEventKind::Exit)));
        assert!(!callbacks.dispatch(&event(CollisionEventKind::Enter).mirrored()));
        assert_eq!(*received.borrow(), vec![Entity::new(2)]);
    }

    #[test]
    fn test_set_replaces_previous_handler() {
        let hits = Rc::new(RefCell::new(0));
        let (first, second) = (Rc::clone(&hits), Rc::clone(&hits));

        let mut callbacks = CollisionCallbacks::new();
        let owner = Entity::new(1);
        callbacks.set(
            owner,
            CollisionEventKind::Stay,
            Box::new(move |_: &CollisionEvent| *first.borrow_mut() += 1),
        );
        callbacks.set(
            owner,
            CollisionEventKind::Stay,
            Box::new(move |_: &CollisionEvent| *second.borrow_mut() += 10),
        );
        callbacks.dispatch(&event(CollisionEventKind::Stay));

        assert_eq!(*hits.borrow(), 10);
    }

    #[test]
    fn test_clear_owner() {
        let mut callbacks = CollisionCallbacks::new();
        callbacks.set(Entity::new(1), CollisionEventKind::Enter, Box::new(|_: &CollisionEvent| {}));
        callbacks.set(Entity::new(1), CollisionEventKind::Exit, Box::new(|_: &CollisionEvent| {}));
        callbacks.set(Entity::new(2), CollisionEventKind::Exit, Box::new(|_: &CollisionEvent| {}));

        callbacks.clear_owner(Entity::new(1));
        assert!(!callbacks.has(Entity::new(1), CollisionEventKind::Enter));
        assert!(!callbacks.has(Entity::new(1), CollisionEventKind::Exit));
        assert!(callbacks.has(Entity::new(2), CollisionEventKind::Exit));
    }

    #[test]
    fn test_mirrored_swaps_participants() {
        let e = event(CollisionEventKind::Exit);
        let m = e.mirrored();
        assert_eq!(m.this_owner, e.other_owner);
        assert_eq!(m.other_shape, e.this_shape);
        assert_eq!(m.mirrored(), e);
    }
}
