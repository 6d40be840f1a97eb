//! Perception-driven melee NPC controller
//!
//! This crate provides:
//! - A per-tick agent state machine (Idle, Chasing, Attacking, Dead)
//! - Field-of-view and line-of-sight perception against world queries
//! - Throttled path planning, attack cadence and idle variety
//! - A headless simulation host built on hecs and rapier3d

pub mod ai;
pub mod combat;
pub mod core;
pub mod ecs;
pub mod physics;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rapier3d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{Agent, AgentConfig, AgentState, PathPlanner, SteeringPlanner};
    pub use crate::combat::{DamageOutcome, Damageable, Health};
    pub use crate::core::{AgentCue, ClipCategory, EventQueue, GameEvent, Scenario, Simulation};
    pub use crate::ecs::{Name, Tag, Transform, World};
    pub use crate::physics::{Physics, WorldQuery, layers};
    pub use glam::{Quat, Vec3};
}
