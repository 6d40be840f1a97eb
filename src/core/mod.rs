//! Simulation host
//!
//! Time, events, scenario files, roster statistics and the headless
//! [`Simulation`] that drives agents tick by tick.

mod events;
mod scenario;
mod simulation;
mod stats;
mod time;

pub use events::{AgentCue, ClipCategory, CueSink, EventQueue, GameEvent};
pub use scenario::{AgentSpawn, ObstacleSpawn, Scenario, ScenarioError, TargetSpawn};
pub use simulation::{DespawnAfter, ScriptedPath, Simulation};
pub use stats::RosterStats;
pub use time::Time;
