//! Collision registry: broad-phase pair bookkeeping and event dispatch
//!
//! The registry owns every live shape and one [`Contact`] per pair of live
//! shapes with different owners. Registering the Nth shape creates N-1
//! contacts when every owner has one shape; removing a shape drops every
//! contact that references it. Pair pruning is brute force:
//! each contact does its own AABB rejection before the narrow phase.
//!
//! Per step, in order:
//! 1. apply changes queued through [`DeferredChanges`]
//! 2. queue shapes whose owner went inactive for removal
//! 3. purge queued shapes and their contacts
//! 4. refresh every live shape from its owner's world transform
//! 5. evaluate every contact and deliver ENTER/STAY/EXIT to both owners

use crate::config::CollisionConfig;
use crate::events::{CollisionCallbacks, CollisionEvent, CollisionEventKind, CollisionHandler};
use crate::foundation::collections::{ShapeHandle, ShapeMap};
use crate::physics::collision::{Collider, CollisionShape, ShapeError};
use crate::physics::collision_layers::CollisionMatrix;
use crate::physics::contact::{Contact, ContactSignal};
use crate::scene::{Entity, SceneGraph};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Host predicate deciding whether two owners are tested at all
pub type PairFilter = Box<dyn Fn(Entity, Entity) -> bool>;

/// Counters describing one call to [`CollisionRegistry::step`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepStats {
    /// Contacts that emitted ENTER
    pub entered: usize,
    /// Contacts that emitted STAY
    pub stayed: usize,
    /// Contacts that emitted EXIT
    pub exited: usize,
    /// Contacts whose state machine ran
    pub evaluated: usize,
    /// Contacts skipped because an owner was inactive
    pub skipped: usize,
    /// Shapes purged at the start of the step
    pub removed_shapes: usize,
    /// Contacts dropped with those shapes
    pub removed_pairs: usize,
}

/// A registration change requested while the registry was busy
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredChange {
    /// Register a shape for an owner
    Register(Entity, CollisionShape),
    /// Unregister every shape of an owner
    Unregister(Entity),
}

/// Queue of registration changes applied at the start of the next step
///
/// Collision callbacks cannot reach the registry while it dispatches them.
/// A callback that needs to attach or detach shapes captures a clone of this
/// queue instead.
#[derive(Debug, Clone, Default)]
pub struct DeferredChanges {
    queue: Rc<RefCell<Vec<DeferredChange>>>,
}

impl DeferredChanges {
    /// Queue a shape registration
    pub fn register(&self, owner: Entity, shape: CollisionShape) {
        self.queue.borrow_mut().push(DeferredChange::Register(owner, shape));
    }

    /// Queue removal of every shape of `owner`
    pub fn unregister(&self, owner: Entity) {
        self.queue.borrow_mut().push(DeferredChange::Unregister(owner));
    }

    /// Number of queued changes
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    fn take(&self) -> Vec<DeferredChange> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }
}

/// Live shapes, their pairwise contacts, and the callbacks of their owners
pub struct CollisionRegistry {
    config: CollisionConfig,

    /// Shape storage; iteration order comes from `order`
    colliders: ShapeMap<Collider>,

    /// Live shapes in registration order
    order: Vec<ShapeHandle>,

    /// One contact per pair of live shapes
    contacts: Vec<Contact>,

    /// Shapes to purge at the next step boundary
    pending_removal: Vec<ShapeHandle>,

    callbacks: CollisionCallbacks,
    filter: Option<PairFilter>,
    deferred: DeferredChanges,
    next_registration_index: u64,
}

impl Default for CollisionRegistry {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

impl CollisionRegistry {
    /// Create a registry; an invalid collision matrix falls back to the default
    pub fn new(mut config: CollisionConfig) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("CollisionRegistry: {e}; using the default collision matrix");
            config.matrix = CollisionMatrix::default();
        }

        Self {
            config,
            colliders: ShapeMap::with_key(),
            order: Vec::new(),
            contacts: Vec::new(),
            pending_removal: Vec::new(),
            callbacks: CollisionCallbacks::new(),
            filter: None,
            deferred: DeferredChanges::default(),
            next_registration_index: 0,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Suspend or resume all per-step work without touching state
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.config.enabled != enabled {
            log::debug!("CollisionRegistry {}", if enabled { "enabled" } else { "disabled" });
        }
        self.config.enabled = enabled;
    }

    /// Is per-step work running?
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Register a shape for `owner`, pairing it with every live shape of
    /// other owners
    ///
    /// Shapes of the same owner are never paired with each other. Malformed
    /// shapes are accepted and simply never collide; use
    /// [`try_register`](Self::try_register) to reject them instead.
    ///
    /// Callbacks are dropped once the owner's last shape is purged. An owner
    /// that registers again after that must install its callbacks again.
    pub fn register(&mut self, owner: Entity, shape: CollisionShape) -> ShapeHandle {
        let index = self.next_registration_index;
        self.next_registration_index += 1;

        let handle = self.colliders.insert(Collider::new(owner, shape, index));
        let new_collider = &self.colliders[handle];
        for &existing in &self.order {
            if self.colliders[existing].owner() == owner {
                continue;
            }
            self.contacts.push(Contact::new(
                (existing, &self.colliders[existing]),
                (handle, new_collider),
            ));
        }
        self.order.push(handle);

        log::debug!(
            "Registered shape {:?} for {:?} ({} shapes, {} contacts)",
            handle,
            owner,
            self.order.len(),
            self.contacts.len()
        );
        handle
    }

    /// Validate `shape`, then [`register`](Self::register) it
    pub fn try_register(
        &mut self,
        owner: Entity,
        shape: CollisionShape,
    ) -> Result<ShapeHandle, ShapeError> {
        shape.validate()?;
        Ok(self.register(owner, shape))
    }

    /// Queue every shape of `owner` for removal at the next step
    ///
    /// Returns the number of shapes newly queued.
    pub fn unregister(&mut self, owner: Entity) -> usize {
        let handles: Vec<_> = self
            .order
            .iter()
            .copied()
            .filter(|h| self.colliders[*h].owner() == owner)
            .collect();
        handles.into_iter().filter(|h| self.queue_removal(*h)).count()
    }

    /// Queue a single shape for removal at the next step
    pub fn unregister_shape(&mut self, handle: ShapeHandle) -> bool {
        self.colliders.contains_key(handle) && self.queue_removal(handle)
    }

    fn queue_removal(&mut self, handle: ShapeHandle) -> bool {
        if self.pending_removal.contains(&handle) {
            return false;
        }
        log::debug!("Shape {:?} queued for removal", handle);
        self.pending_removal.push(handle);
        true
    }

    /// Set (or replace) the callback `owner` receives for `kind`
    ///
    /// Callbacks live as long as the owner has at least one registered
    /// shape. When its last shape is purged they are dropped.
    pub fn set_callback<H>(&mut self, owner: Entity, kind: CollisionEventKind, handler: H)
    where
        H: CollisionHandler + 'static,
    {
        self.callbacks.set(owner, kind, Box::new(handler));
    }

    /// Drop every callback of `owner`
    pub fn clear_callbacks(&mut self, owner: Entity) {
        self.callbacks.clear_owner(owner);
    }

    /// Install a host predicate consulted before evaluating each contact
    pub fn set_filter<F>(&mut self, filter: F)
    where
        F: Fn(Entity, Entity) -> bool + 'static,
    {
        self.filter = Some(Box::new(filter));
    }

    /// Remove the host predicate
    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    /// Handle for queuing registration changes from inside callbacks
    pub fn deferred(&self) -> DeferredChanges {
        self.deferred.clone()
    }

    /// Advance one simulation step
    pub fn step(&mut self, dt: f32, scene: &dyn SceneGraph) -> StepStats {
        let mut stats = StepStats::default();
        if !self.config.enabled {
            return stats;
        }
        log::trace!("CollisionRegistry step dt={dt}");

        self.apply_deferred();

        let inactive: Vec<_> = self
            .order
            .iter()
            .copied()
            .filter(|h| !scene.is_active(self.colliders[*h].owner()))
            .collect();
        for handle in inactive {
            self.queue_removal(handle);
        }
        self.flush_removals(&mut stats);

        for handle in &self.order {
            let collider = &mut self.colliders[*handle];
            let transform = scene.world_transform(collider.owner());
            collider.refresh(transform.as_ref());
        }

        self.evaluate_contacts(scene, &mut stats);
        stats
    }

    fn apply_deferred(&mut self) {
        for change in self.deferred.take() {
            match change {
                DeferredChange::Register(owner, shape) => {
                    self.register(owner, shape);
                }
                DeferredChange::Unregister(owner) => {
                    self.unregister(owner);
                }
            }
        }
    }

    /// Purge queued shapes and every contact that references them
    fn flush_removals(&mut self, stats: &mut StepStats) {
        if self.pending_removal.is_empty() {
            return;
        }
        let removed: HashSet<ShapeHandle> = self.pending_removal.drain(..).collect();

        let mut exits = Vec::new();
        let exit_on_removal = self.config.exit_on_removal;
        let colliders = &self.colliders;
        self.contacts.retain(|contact| {
            let (first, second) = (contact.first(), contact.second());
            let (first_gone, second_gone) = (removed.contains(&first), removed.contains(&second));
            if !first_gone && !second_gone {
                return true;
            }

            stats.removed_pairs += 1;
            if exit_on_removal && contact.is_touching() && first_gone != second_gone {
                let (survivor, gone) = if first_gone { (second, first) } else { (first, second) };
                exits.push(CollisionEvent {
                    kind: CollisionEventKind::Exit,
                    this_owner: colliders[survivor].owner(),
                    this_shape: survivor,
                    other_owner: colliders[gone].owner(),
                    other_shape: gone,
                });
            }
            false
        });

        self.order.retain(|h| !removed.contains(h));
        let mut departed_owners = HashSet::new();
        for handle in removed {
            if let Some(collider) = self.colliders.remove(handle) {
                departed_owners.insert(collider.owner());
                stats.removed_shapes += 1;
            }
        }

        // Callbacks belong to the shapes; an owner with none left loses them
        for owner in departed_owners {
            if !self.order.iter().any(|h| self.colliders[*h].owner() == owner) {
                self.callbacks.clear_owner(owner);
            }
        }

        for event in &exits {
            self.callbacks.dispatch(event);
        }
        log::debug!(
            "Purged {} shapes and {} contacts ({} shapes remain)",
            stats.removed_shapes,
            stats.removed_pairs,
            self.order.len()
        );
    }

    fn evaluate_contacts(&mut self, scene: &dyn SceneGraph, stats: &mut StepStats) {
        let Self { config, colliders, contacts, callbacks, filter, .. } = self;

        for contact in contacts.iter_mut() {
            let (first, second) = (&colliders[contact.first()], &colliders[contact.second()]);
            let (owner_a, owner_b) = (first.owner(), second.owner());
            if !scene.is_active(owner_a) || !scene.is_active(owner_b) {
                stats.skipped += 1;
                continue;
            }

            let allowed = config.matrix.should_collide(scene.group(owner_a), scene.group(owner_b))
                && filter.as_ref().map_or(true, |f| f(owner_a, owner_b));
            let signal = if allowed {
                contact.update_state(first, second)
            } else {
                contact.advance(false)
            };
            stats.evaluated += 1;

            let kind = match signal {
                ContactSignal::None => continue,
                ContactSignal::Enter => {
                    stats.entered += 1;
                    CollisionEventKind::Enter
                }
                ContactSignal::Stay => {
                    stats.stayed += 1;
                    CollisionEventKind::Stay
                }
                ContactSignal::Exit => {
                    stats.exited += 1;
                    CollisionEventKind::Exit
                }
            };

            // Earlier-registered shape hears about it first
            let (lower, higher) = if first.registration_index() <= second.registration_index() {
                (contact.first(), contact.second())
            } else {
                (contact.second(), contact.first())
            };
            let event = CollisionEvent {
                kind,
                this_owner: colliders[lower].owner(),
                this_shape: lower,
                other_owner: colliders[higher].owner(),
                other_shape: higher,
            };
            if config.log_transitions {
                log::trace!(
                    "{:?}: {:?} <-> {:?}",
                    kind,
                    event.this_owner,
                    event.other_owner
                );
            }
            callbacks.dispatch(&event);
            callbacks.dispatch(&event.mirrored());
        }
    }

    /// Registered shape behind `handle`
    pub fn shape(&self, handle: ShapeHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    /// Live shapes in registration order
    pub fn shapes(&self) -> impl Iterator<Item = (ShapeHandle, &Collider)> + '_ {
        self.order.iter().map(move |h| (*h, &self.colliders[*h]))
    }

    /// Live shapes owned by `owner`
    pub fn shapes_of(&self, owner: Entity) -> Vec<ShapeHandle> {
        self.shapes()
            .filter(|(_, collider)| collider.owner() == owner)
            .map(|(handle, _)| handle)
            .collect()
    }

    /// All live contacts
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Number of live shapes
    pub fn shape_count(&self) -> usize {
        self.order.len()
    }

    /// Number of live contacts
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Number of shapes waiting for the next purge
    pub fn pending_removal_count(&self) -> usize {
        self.pending_removal.len()
    }

    /// Pairs that were touching after the last step
    pub fn touching_pairs(&self) -> impl Iterator<Item = (ShapeHandle, ShapeHandle)> + '_ {
        self.contacts
            .iter()
            .filter(|c| c.is_touching())
            .map(|c| (c.first(), c.second()))
    }

    /// Were `a` and `b` touching after the last step?
    pub fn is_touching(&self, a: ShapeHandle, b: ShapeHandle) -> bool {
        self.contacts
            .iter()
            .any(|c| c.involves(a) && c.other(a) == Some(b) && c.is_touching())
    }

    /// Drop every shape, contact, callback and queued change
    pub fn clear(&mut self) {
        self.colliders.clear();
        self.order.clear();
        self.contacts.clear();
        self.pending_removal.clear();
        self.callbacks.clear();
        self.deferred.take();
        log::debug!("CollisionRegistry cleared");
    }
}

impl std::fmt::Debug for CollisionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionRegistry")
            .field("enabled", &self.config.enabled)
            .field("shapes", &self.order.len())
            .field("contacts", &self.contacts.len())
            .field("pending_removal", &self.pending_removal.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Transform2D, Vec2};
    use crate::scene::SimpleListGraph;
    use std::cell::Cell;

    type Log = Rc<RefCell<Vec<(CollisionEventKind, Entity, Entity)>>>;

    fn record_all(registry: &mut CollisionRegistry, owner: Entity, log: &Log) {
        let kinds = [CollisionEventKind::Enter, CollisionEventKind::Stay, CollisionEventKind::Exit];
        for kind in kinds {
            let sink = Rc::clone(log);
            registry.set_callback(owner, kind, move |e: &CollisionEvent| {
                sink.borrow_mut().push((e.kind, e.this_owner, e.other_owner));
            });
        }
    }

    fn at(x: f32, y: f32) -> Transform2D {
        Transform2D::from_position(Vec2::new(x, y))
    }

    #[test]
    fn test_pair_creation_counts() {
        let mut scene = SimpleListGraph::new();
        let a = scene.spawn(at(0.0, 0.0));
        let b = scene.spawn(at(0.0, 0.0));
        let c = scene.spawn(at(0.0, 0.0));
        let mut registry = CollisionRegistry::default();

        let ha = registry.register(a, CollisionShape::circle(1.0));
        let hb = registry.register(b, CollisionShape::rect(1.0, 1.0));
        assert_eq!(registry.contact_count(), 1);

        let hc = registry.register(c, CollisionShape::circle(1.0));
        assert_eq!(registry.contact_count(), 3);

        let pairs: HashSet<_> = registry
            .contacts()
            .iter()
            .map(|contact| {
                let (x, y) = (contact.first(), contact.second());
                if x < y { (x, y) } else { (y, x) }
            })
            .collect();
        assert_eq!(pairs.len(), 3);
        for (x, y) in [(ha, hb), (ha, hc), (hb, hc)] {
            assert!(pairs.contains(&(x.min(y), x.max(y))));
        }
    }

    #[test]
    fn test_enter_stay_exit_reach_both_owners() {
        let mut scene = SimpleListGraph::new();
        let a = scene.spawn(at(0.0, 0.0));
        let b = scene.spawn(at(20.0, 0.0));
        let mut registry = CollisionRegistry::default();
        registry.register(a, CollisionShape::circle(5.0));
        registry.register(b, CollisionShape::circle(4.0));

        let log: Log = Rc::default();
        record_all(&mut registry, a, &log);
        record_all(&mut registry, b, &log);

        let stats = registry.step(0.016, &scene);
        assert_eq!(stats.evaluated, 1);
        assert!(log.borrow().is_empty());

        scene.set_transform(b, at(8.0, 0.0));
        let stats = registry.step(0.016, &scene);
        assert_eq!(stats.entered, 1);
        assert_eq!(
            *log.borrow(),
            vec![(CollisionEventKind::Enter, a, b), (CollisionEventKind::Enter, b, a)]
        );

        log.borrow_mut().clear();
        let stats = registry.step(0.016, &scene);
        assert_eq!(stats.stayed, 1);
        assert_eq!(log.borrow().len(), 2);

        log.borrow_mut().clear();
        scene.set_transform(b, at(10.0, 0.0));
        let stats = registry.step(0.016, &scene);
        assert_eq!(stats.exited, 1);
        assert_eq!(
            *log.borrow(),
            vec![(CollisionEventKind::Exit, a, b), (CollisionEventKind::Exit, b, a)]
        );
    }

    #[test]
    fn test_swapped_polygon_circle_dispatch_order() {
        let mut scene = SimpleListGraph::new();
        let circle_owner = scene.spawn(at(0.0, 0.0));
        let box_owner = scene.spawn(at(1.0, 0.0));
        let mut registry = CollisionRegistry::default();
        let circle = registry.register(circle_owner, CollisionShape::circle(1.0));
        let rect = registry.register(box_owner, CollisionShape::rect(2.0, 2.0));

        // Stored polygon first, but the circle was registered first
        assert_eq!(registry.contacts()[0].first(), rect);

        let log: Log = Rc::default();
        record_all(&mut registry, circle_owner, &log);
        record_all(&mut registry, box_owner, &log);
        registry.step(0.016, &scene);

        assert_eq!(
            *log.borrow(),
            vec![
                (CollisionEventKind::Enter, circle_owner, box_owner),
                (CollisionEventKind::Enter, box_owner, circle_owner),
            ]
        );
        assert!(registry.is_touching(circle, rect));
        assert!(registry.is_touching(rect, circle));
    }

    #[test]
    fn test_disabled_registry_does_nothing() {
        let mut scene = SimpleListGraph::new();
        let a = scene.spawn(at(0.0, 0.0));
        let b = scene.spawn(at(0.5, 0.0));
        let mut registry = CollisionRegistry::default();
        registry.register(a, CollisionShape::circle(1.0));
        registry.register(b, CollisionShape::circle(1.0));

        registry.set_enabled(false);
        scene.set_active(b, false);
        assert_eq!(registry.step(0.016, &scene), StepStats::default());
        assert_eq!(registry.shape_count(), 2);
        assert_eq!(registry.touching_pairs().count(), 0);

        registry.set_enabled(true);
        scene.set_active(b, true);
        assert_eq!(registry.step(0.016, &scene).entered, 1);
    }

    #[test]
    fn test_unregister_is_deferred_to_next_step() {
        let mut scene = SimpleListGraph::new();
        let a = scene.spawn(at(0.0, 0.0));
        let b = scene.spawn(at(0.5, 0.0));
        let mut registry = CollisionRegistry::default();
        registry.register(a, CollisionShape::circle(1.0));
        registry.register(b, CollisionShape::circle(1.0));
        registry.register(b, CollisionShape::rect(1.0, 1.0));
        assert_eq!(registry.contact_count(), 2);

        assert_eq!(registry.unregister(b), 2);
        assert_eq!(registry.unregister(b), 0);
        assert_eq!(registry.shape_count(), 3);
        assert_eq!(registry.pending_removal_count(), 2);

        let stats = registry.step(0.016, &scene);
        assert_eq!(stats.removed_shapes, 2);
        assert_eq!(stats.removed_pairs, 2);
        assert_eq!(registry.shape_count(), 1);
        assert_eq!(registry.contact_count(), 0);
        assert!(registry.shapes_of(b).is_empty());
    }

    #[test]
    fn test_inactive_owner_is_purged_without_exit() {
        let mut scene = SimpleListGraph::new();
        let a = scene.spawn(at(0.0, 0.0));
        let b = scene.spawn(at(0.5, 0.0));
        let mut registry = CollisionRegistry::default();
        registry.register(a, CollisionShape::circle(1.0));
        registry.register(b, CollisionShape::circle(1.0));

        let log: Log = Rc::default();
        record_all(&mut registry, a, &log);
        registry.step(0.016, &scene);
        assert_eq!(log.borrow().len(), 1);

        scene.set_active(b, false);
        let stats = registry.step(0.016, &scene);
        assert_eq!(stats.removed_shapes, 1);
        assert_eq!(stats.exited, 0);
        assert_eq!(registry.contact_count(), 0);
        // Only the original ENTER
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_exit_on_removal_notifies_survivor() {
        let mut scene = SimpleListGraph::new();
        let a = scene.spawn(at(0.0, 0.0));
        let b = scene.spawn(at(0.5, 0.0));
        let config = CollisionConfig { exit_on_removal: true, ..CollisionConfig::default() };
        let mut registry = CollisionRegistry::new(config);
        registry.register(a, CollisionShape::circle(1.0));
        registry.register(b, CollisionShape::circle(1.0));

        let log: Log = Rc::default();
        record_all(&mut registry, a, &log);
        record_all(&mut registry, b, &log);
        registry.step(0.016, &scene);
        log.borrow_mut().clear();

        registry.unregister(b);
        registry.step(0.016, &scene);
        assert_eq!(*log.borrow(), vec![(CollisionEventKind::Exit, a, b)]);
    }

    #[test]
    fn test_removed_owner_loses_callbacks() {
        let mut scene = SimpleListGraph::new();
        let a = scene.spawn(at(0.0, 0.0));
        let b = scene.spawn(at(0.5, 0.0));
        let mut registry = CollisionRegistry::default();
        registry.register(a, CollisionShape::circle(1.0));

        let log: Log = Rc::default();
        record_all(&mut registry, a, &log);
        registry.unregister(a);
        registry.step(0.016, &scene);

        registry.register(a, CollisionShape::circle(1.0));
        registry.register(b, CollisionShape::circle(1.0));
        assert_eq!(registry.step(0.016, &scene).entered, 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_deferred_changes_from_callback() {
        let mut scene = SimpleListGraph::new();
        let a = scene.spawn(at(0.0, 0.0));
        let b = scene.spawn(at(0.5, 0.0));
        let spawned = scene.spawn(at(100.0, 0.0));
        let mut registry = CollisionRegistry::default();
        registry.register(a, CollisionShape::circle(1.0));
        registry.register(b, CollisionShape::circle(1.0));

        let deferred = registry.deferred();
        registry.set_callback(a, CollisionEventKind::Enter, move |e: &CollisionEvent| {
            deferred.register(spawned, CollisionShape::rect(1.0, 1.0));
            deferred.unregister(e.other_owner);
        });

        registry.step(0.016, &scene);
        assert_eq!(registry.shape_count(), 2);
        assert_eq!(registry.deferred().len(), 2);

        let stats = registry.step(0.016, &scene);
        assert!(registry.deferred().is_empty());
        assert_eq!(stats.removed_shapes, 1);
        assert_eq!(registry.shapes_of(spawned).len(), 1);
        assert!(registry.shapes_of(b).is_empty());
        assert_eq!(registry.contact_count(), 1);
    }

    #[test]
    fn test_filter_blocks_and_exits() {
        let mut scene = SimpleListGraph::new();
        let a = scene.spawn(at(0.0, 0.0));
        let b = scene.spawn(at(0.5, 0.0));
        let mut registry = CollisionRegistry::default();
        registry.register(a, CollisionShape::circle(1.0));
        registry.register(b, CollisionShape::circle(1.0));

        assert_eq!(registry.step(0.016, &scene).entered, 1);

        registry.set_filter(|_, _| false);
        assert_eq!(registry.step(0.016, &scene).exited, 1);
        assert_eq!(registry.step(0.016, &scene).entered, 0);

        registry.clear_filter();
        assert_eq!(registry.step(0.016, &scene).entered, 1);
    }

    #[test]
    fn test_group_matrix_filtering() {
        let mut scene = SimpleListGraph::new();
        let a = scene.spawn(at(0.0, 0.0));
        let b = scene.spawn(at(0.5, 0.0));
        let c = scene.spawn(at(-0.5, 0.0));
        scene.set_group(a, Some(0));
        scene.set_group(b, Some(1));

        let mut config = CollisionConfig::default();
        config.matrix.allow(0, 1, false);
        let mut registry = CollisionRegistry::new(config);
        let ha = registry.register(a, CollisionShape::circle(1.0));
        let hb = registry.register(b, CollisionShape::circle(1.0));
        let hc = registry.register(c, CollisionShape::circle(1.0));

        let stats = registry.step(0.016, &scene);
        // a-b filtered; a-c and b-c ungrouped c collides with everything
        assert_eq!(stats.entered, 2);
        assert!(!registry.is_touching(ha, hb));
        assert!(registry.is_touching(ha, hc));
        assert!(registry.is_touching(hb, hc));
    }

    #[test]
    fn test_invalid_matrix_falls_back_to_default() {
        let config = CollisionConfig {
            matrix: CollisionMatrix::from_rows(vec![vec![true, false], vec![true, true]]),
            ..CollisionConfig::default()
        };
        let registry = CollisionRegistry::new(config);
        assert_eq!(registry.config().matrix, CollisionMatrix::default());
    }

    /// Scene whose activity can change while the registry dispatches callbacks
    struct ToggleScene {
        inner: SimpleListGraph,
        inactive: RefCell<HashSet<Entity>>,
        transforms_served: Cell<usize>,
    }

    impl SceneGraph for ToggleScene {
        fn is_active(&self, entity: Entity) -> bool {
            self.inner.is_active(entity) && !self.inactive.borrow().contains(&entity)
        }

        fn world_transform(&self, entity: Entity) -> Option<Transform2D> {
            self.transforms_served.set(self.transforms_served.get() + 1);
            self.inner.world_transform(entity)
        }
    }

    #[test]
    fn test_owner_deactivated_mid_step_is_skipped_then_purged() {
        let mut inner = SimpleListGraph::new();
        let a = inner.spawn(at(0.0, 0.0));
        let b = inner.spawn(at(0.5, 0.0));
        let c = inner.spawn(at(-0.5, 0.0));
        let scene = Rc::new(ToggleScene {
            inner,
            inactive: RefCell::default(),
            transforms_served: Cell::new(0),
        });

        let mut registry = CollisionRegistry::default();
        registry.register(a, CollisionShape::circle(1.0));
        registry.register(b, CollisionShape::circle(1.0));
        registry.register(c, CollisionShape::circle(1.0));

        // a deactivates c as soon as it touches b
        let handle = Rc::clone(&scene);
        registry.set_callback(a, CollisionEventKind::Enter, move |e: &CollisionEvent| {
            if e.other_owner == b {
                handle.inactive.borrow_mut().insert(c);
            }
        });

        let stats = registry.step(0.016, scene.as_ref());
        assert_eq!(stats.entered, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(scene.transforms_served.get(), 3);
        assert_eq!(registry.shape_count(), 3);

        let stats = registry.step(0.016, scene.as_ref());
        assert_eq!(stats.removed_shapes, 1);
        assert_eq!(registry.shape_count(), 2);
        assert_eq!(registry.contact_count(), 1);
    }

    /// Scene where owners are active but have no placement
    struct NoTransformScene;

    impl SceneGraph for NoTransformScene {
        fn is_active(&self, _entity: Entity) -> bool {
            true
        }

        fn world_transform(&self, _entity: Entity) -> Option<Transform2D> {
            None
        }
    }

    #[test]
    fn test_missing_transforms_keep_stale_geometry() {
        let mut scene = SimpleListGraph::new();
        let a = scene.spawn(at(0.0, 0.0));
        let b = scene.spawn(at(0.5, 0.0));
        let mut registry = CollisionRegistry::default();
        let ha = registry.register(a, CollisionShape::circle(1.0));
        registry.register(b, CollisionShape::circle(1.0));

        registry.step(0.016, &scene);
        let aabb = *registry.shape(ha).unwrap().aabb();

        // Still touching on stale geometry
        let stats = registry.step(0.016, &NoTransformScene);
        assert_eq!(stats.stayed, 1);
        assert_eq!(*registry.shape(ha).unwrap().aabb(), aabb);
    }

    #[test]
    fn test_shapes_of_one_owner_never_pair() {
        let mut scene = SimpleListGraph::new();
        let ship = scene.spawn(at(0.0, 0.0));
        let rock = scene.spawn(at(1.5, 0.0));
        let mut registry = CollisionRegistry::default();
        let hull = registry.register(ship, CollisionShape::rect(2.0, 2.0));
        let shield = registry.register(ship, CollisionShape::circle(1.0));
        assert_eq!(registry.contact_count(), 0);

        let log: Log = Rc::default();
        record_all(&mut registry, ship, &log);
        let stats = registry.step(0.016, &scene);
        assert_eq!(stats, StepStats::default());
        assert!(log.borrow().is_empty());
        assert!(!registry.is_touching(hull, shield));

        // Both shapes still pair with other owners
        registry.register(rock, CollisionShape::circle(1.0));
        assert_eq!(registry.contact_count(), 2);
        let stats = registry.step(0.016, &scene);
        assert_eq!(stats.entered, 2);
        assert!(log.borrow().iter().all(|(_, this, other)| *this == ship && *other == rock));
    }

    #[test]
    fn test_malformed_shapes_never_collide() {
        let mut scene = SimpleListGraph::new();
        let negative = scene.spawn(at(0.0, 0.0));
        let big = scene.spawn(at(3.0, 0.0));
        let nan = scene.spawn(at(1.0, 0.0));
        let mut registry = CollisionRegistry::default();
        let h_negative = registry.register(negative, CollisionShape::circle(-1.0));
        let h_big = registry.register(big, CollisionShape::circle(5.0));
        registry.register(nan, CollisionShape::circle(f32::NAN));
        registry.register(nan, CollisionShape::rect(2.0, -2.0));

        let stats = registry.step(0.016, &scene);
        assert_eq!(stats.entered, 0);
        assert_eq!(registry.touching_pairs().count(), 0);
        assert!(!registry.is_touching(h_negative, h_big));
    }

    #[test]
    fn test_try_register_rejects_bad_shapes() {
        let mut registry = CollisionRegistry::default();
        let result = registry.try_register(Entity::new(0), CollisionShape::circle(f32::NAN));
        assert_eq!(result, Err(ShapeError::NonFinite));
        assert_eq!(registry.shape_count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut registry = CollisionRegistry::default();
        registry.register(Entity::new(0), CollisionShape::circle(1.0));
        registry.register(Entity::new(1), CollisionShape::circle(1.0));
        registry.deferred().unregister(Entity::new(0));
        registry.clear();

        assert_eq!(registry.shape_count(), 0);
        assert_eq!(registry.contact_count(), 0);
        assert!(registry.deferred().is_empty());
    }
}
