//! World wrapper around hecs

use glam::Vec3;
use hecs::Entity;

use super::components::{Tag, Transform};
use super::hierarchy;
use crate::ai::{SceneGraph, TargetDiscovery};
use crate::combat::{Damageable, Health};

/// Game world containing all entities and components
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Despawn an entity
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Link `child` under `parent` in the scene hierarchy
    pub fn attach(&mut self, parent: Entity, child: Entity) -> Result<(), hecs::NoSuchEntity> {
        hierarchy::attach(&mut self.inner, parent, child)
    }

    /// World position of an entity, if it has a transform
    pub fn position(&self, entity: Entity) -> Option<Vec3> {
        self.inner.get::<&Transform>(entity).ok().map(|t| t.position)
    }

    /// An entity is alive while it exists and its health (if any) is above zero
    pub fn is_alive(&self, entity: Entity) -> bool {
        if !self.inner.contains(entity) {
            return false;
        }
        self.inner
            .get::<&Health>(entity)
            .map(|h| !h.is_dead())
            .unwrap_or(true)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetDiscovery for World {
    fn find_by_tag(&self, tag: &str) -> Option<Entity> {
        let candidates: Vec<Entity> = self
            .inner
            .query::<&Tag>()
            .iter()
            .filter(|(_, t)| t.is(tag))
            .map(|(entity, _)| entity)
            .collect();

        candidates.into_iter().find(|&entity| self.locate(entity).is_some())
    }

    fn locate(&self, entity: Entity) -> Option<Vec3> {
        if !self.is_alive(entity) {
            return None;
        }
        self.position(entity)
    }
}

impl SceneGraph for World {
    fn is_self_or_descendant(&self, entity: Entity, ancestor: Entity) -> bool {
        hierarchy::is_self_or_descendant(&self.inner, entity, ancestor)
    }
}
