//! Scene seam: how the collision registry sees the host's objects
//!
//! The registry never owns transforms or object lifetimes. Each step it asks
//! a [`SceneGraph`] whether an owner is active, where it is placed, and
//! which collision group it belongs to.

mod entity;

pub use entity::Entity;

use crate::foundation::math::Transform2D;

/// Host object graph consulted by the registry once per step
///
/// Following the engine's pluggable scene graph pattern, any host structure
/// (an ECS world, a node tree, a flat list) can back the registry.
pub trait SceneGraph {
    /// Is the owner alive and participating this step?
    fn is_active(&self, entity: Entity) -> bool;

    /// Current world placement, `None` while the owner has none
    fn world_transform(&self, entity: Entity) -> Option<Transform2D>;

    /// Collision group index for matrix filtering, `None` to collide with every group
    fn group(&self, _entity: Entity) -> Option<usize> {
        None
    }
}

/// Per-object data kept by [`SimpleListGraph`]
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// World placement
    pub transform: Transform2D,
    /// Whether the object participates in collision
    pub active: bool,
    /// Optional collision group
    pub group: Option<usize>,
}

/// Simple list-based scene graph (linear lookup)
///
/// Sufficient for tests and small sandboxes. Unknown entities are inactive
/// and have no transform.
#[derive(Debug, Default)]
pub struct SimpleListGraph {
    nodes: Vec<(Entity, SceneNode)>,
    next_id: u32,
}

impl SimpleListGraph {
    /// Create a new empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an active object at `transform` and return its handle
    pub fn spawn(&mut self, transform: Transform2D) -> Entity {
        let entity = Entity::new(self.next_id);
        self.next_id += 1;
        self.nodes.push((entity, SceneNode { transform, active: true, group: None }));
        entity
    }

    /// Remove an object; it reports inactive from now on
    pub fn despawn(&mut self, entity: Entity) {
        self.nodes.retain(|(e, _)| *e != entity);
    }

    /// Move an object
    pub fn set_transform(&mut self, entity: Entity, transform: Transform2D) {
        if let Some(node) = self.node_mut(entity) {
            node.transform = transform;
        }
    }

    /// Activate or deactivate an object
    pub fn set_active(&mut self, entity: Entity, active: bool) {
        if let Some(node) = self.node_mut(entity) {
            node.active = active;
        }
    }

    /// Assign a collision group
    pub fn set_group(&mut self, entity: Entity, group: Option<usize>) {
        if let Some(node) = self.node_mut(entity) {
            node.group = group;
        }
    }

    /// Look up an object's data
    pub fn node(&self, entity: Entity) -> Option<&SceneNode> {
        self.nodes.iter().find(|(e, _)| *e == entity).map(|(_, node)| node)
    }

    /// Number of objects in the graph
    pub fn entity_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_mut(&mut self, entity: Entity) -> Option<&mut SceneNode> {
        self.nodes.iter_mut().find(|(e, _)| *e == entity).map(|(_, node)| node)
    }
}

impl SceneGraph for SimpleListGraph {
    fn is_active(&self, entity: Entity) -> bool {
        self.node(entity).is_some_and(|node| node.active)
    }

    fn world_transform(&self, entity: Entity) -> Option<Transform2D> {
        self.node(entity).map(|node| node.transform)
    }

    fn group(&self, entity: Entity) -> Option<usize> {
        self.node(entity).and_then(|node| node.group)
    }
}
