//! Melee agent AI
//!
//! Perception, locomotion, combat timing, idle variety and the state machine
//! that ties them together into one per-tick decision for each [`Agent`].

mod agent;
mod combat;
mod config;
mod fsm;
mod idle;
mod locomotion;
mod perception;
mod steering;

pub use agent::{Agent, DamageContext, EntityLifecycle, TickContext, TickOutcome};
pub use combat::{AttackContext, AttackReport, CombatController, attack_origin, execute_attack};
pub use config::{AgentConfig, ConfigError, MIN_IDLE_DELAY};
pub use fsm::{AgentState, EntryEffect, EntryEffects, StateMachine, Transition};
pub use idle::IdleVarietyScheduler;
pub use locomotion::{LocomotionBridge, PathPlanner, face_towards};
pub use perception::{
    SceneGraph, TargetDiscovery, TargetFix, can_see_target, is_target_detected,
    is_target_tracked, should_lose_interest,
};
pub use steering::{Arrive, SteeringBehavior, SteeringOutput, SteeringPlanner};
