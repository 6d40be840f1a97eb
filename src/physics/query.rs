//! World query facility used by perception and combat
//!
//! The agent only ever asks two questions of the physical world: "what is the
//! first solid thing along this segment" and "who overlaps this sphere".

use glam::Vec3;
use hecs::Entity;

/// Collision layer bits shared by colliders and query masks.
pub mod layers {
    /// Untagged geometry
    pub const DEFAULT: u32 = 1 << 0;
    /// Walls and props that block line of sight
    pub const OBSTACLE: u32 = 1 << 1;
    /// The player (default attack target layer)
    pub const PLAYER: u32 = 1 << 2;
    /// Enemy agents
    pub const ENEMY: u32 = 1 << 3;
    /// Every layer
    pub const ALL: u32 = u32::MAX;
}

/// A line-segment probe into the world.
#[derive(Debug, Clone, Copy)]
pub struct RayProbe {
    /// Ray origin in world space
    pub origin: Vec3,
    /// Ray direction (normalized by the implementation)
    pub direction: Vec3,
    /// Maximum travel distance
    pub max_distance: f32,
    /// Layers the ray may hit
    pub layer_mask: u32,
    /// Colliders owned by this entity are skipped (the observer itself)
    pub ignore: Option<Entity>,
}

/// Result of a raycast
#[derive(Debug, Clone)]
pub struct RaycastHit {
    /// Entity owning the collider that was hit, if any
    pub entity: Option<Entity>,
    /// Layer bits of the collider that was hit
    pub layers: u32,
    /// The point of intersection
    pub point: Vec3,
    /// Distance from ray origin
    pub distance: f32,
}

/// Geometric queries against the simulation world.
///
/// Both queries ignore sensor (trigger-only) geometry and are single,
/// bounded-cost calls; callers never retry within a tick.
pub trait WorldQuery {
    /// Nearest solid hit along the probe, or `None` when the segment is clear.
    fn raycast(&self, probe: &RayProbe) -> Option<RaycastHit>;

    /// Entities owning a collider on `layer_mask` that overlaps the sphere.
    ///
    /// An entity with several overlapping colliders may appear more than once.
    fn overlap_sphere(&self, center: Vec3, radius: f32, layer_mask: u32) -> Vec<Entity>;
}
