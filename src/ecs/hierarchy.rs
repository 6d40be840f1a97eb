//! Entity hierarchy components
//!
//! Provides parent-child relationships between entities. Perception uses the
//! hierarchy to accept line-of-sight hits on a target's child colliders
//! (weapons, hit boxes) as hits on the target itself.

use hecs::Entity;
use smallvec::SmallVec;

/// Upper bound on parent links followed before giving up (guards against cycles)
const MAX_DEPTH: usize = 64;

/// Parent component - indicates this entity has a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

impl Parent {
    /// Create a new parent reference
    #[must_use]
    pub const fn new(entity: Entity) -> Self {
        Self(entity)
    }

    /// Get the parent entity
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.0
    }
}

/// Children component - tracks all children of this entity
#[derive(Debug, Clone, Default)]
pub struct Children(pub SmallVec<[Entity; 8]>);

impl Children {
    /// Create an empty children list
    #[must_use]
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Add a child
    pub fn add(&mut self, child: Entity) {
        if !self.0.contains(&child) {
            self.0.push(child);
        }
    }

    /// Remove a child
    pub fn remove(&mut self, child: Entity) -> bool {
        if let Some(pos) = self.0.iter().position(|&e| e == child) {
            self.0.remove(pos);
            true
        } else {
            false
        }
    }

    /// Check if this entity has children
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of children
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over children
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.0.iter()
    }
}

/// Link `child` under `parent`, updating both sides of the relationship.
///
/// Re-parenting removes the child from its previous parent's list.
pub fn attach(world: &mut hecs::World, parent: Entity, child: Entity) -> Result<(), hecs::NoSuchEntity> {
    if !world.contains(parent) || !world.contains(child) {
        return Err(hecs::NoSuchEntity);
    }

    let previous = world.get::<&Parent>(child).ok().map(|p| p.entity());
    if let Some(previous) = previous {
        if let Ok(mut children) = world.get::<&mut Children>(previous) {
            children.remove(child);
        }
    }

    world.insert_one(child, Parent::new(parent)).map_err(|_| hecs::NoSuchEntity)?;

    let has_children = world.get::<&Children>(parent).is_ok();
    if has_children {
        if let Ok(mut children) = world.get::<&mut Children>(parent) {
            children.add(child);
        }
    } else {
        let mut children = Children::new();
        children.add(child);
        world.insert_one(parent, children).map_err(|_| hecs::NoSuchEntity)?;
    }

    Ok(())
}

/// Returns true if `entity` is `ancestor` or sits somewhere below it.
#[must_use]
pub fn is_self_or_descendant(world: &hecs::World, entity: Entity, ancestor: Entity) -> bool {
    let mut current = entity;
    for _ in 0..MAX_DEPTH {
        if current == ancestor {
            return true;
        }
        match world.get::<&Parent>(current) {
            Ok(parent) => current = parent.entity(),
            Err(_) => return false,
        }
    }
    false
}
