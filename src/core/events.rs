//! Event Queue for agent cues and simulation events
//!
//! Agents never call into animation or audio. They emit [`AgentCue`]s into a
//! [`CueSink`]; the host's [`EventQueue`] collects them together with combat
//! and lifecycle events, double-buffered so consumers read a stable snapshot
//! of the previous simulation tick.
//!
//! # Example
//!
//! ```ignore
//! // After Simulation::tick
//! for event in sim.events.iter() {
//!     if let GameEvent::Cue { agent, cue: AgentCue::PlayClip(category) } = event {
//!         audio.play_random(*agent, *category);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::ai::AgentState;

// ============================================================================
// Event Types
// ============================================================================

/// Audio clip categories an agent can request.
///
/// The host picks a concrete clip from the category's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClipCategory {
    Idle,
    Chase,
    Attack,
    Hurt,
    Death,
}

/// Outbound animation/audio parameter updates from one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentCue {
    /// Planar speed (every tick)
    MoveSpeed(f32),
    /// Whether the agent is attacking (every tick)
    Attacking(bool),
    /// Death flag
    Dead(bool),
    /// Attack animation variant to play
    AttackIndex(u32),
    /// One-shot attack trigger
    AttackTriggered,
    /// One-shot flinch trigger
    HitReaction,
    /// One-shot death trigger
    DeathTriggered,
    /// Idle fidget variant to play
    IdleVariant(u32),
    /// Play a clip from this category
    PlayClip(ClipCategory),
}

/// Simulation events for inter-system communication.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GameEvent {
    // -------------------------------------------------------------------------
    // Agent Events
    // -------------------------------------------------------------------------
    /// An agent emitted a cue.
    Cue {
        /// The emitting agent
        agent: Entity,
        /// The cue
        cue: AgentCue,
    },

    /// An agent changed behavioral state.
    StateChanged {
        agent: Entity,
        from: AgentState,
        to: AgentState,
    },

    // -------------------------------------------------------------------------
    // Combat Events
    // -------------------------------------------------------------------------
    /// An entity took damage.
    EntityDamaged {
        /// The entity that was damaged
        entity: Entity,
        /// Amount of damage dealt
        amount: f32,
        /// Entity that caused the damage, if any
        source: Option<Entity>,
    },

    /// An entity was killed.
    EntityKilled {
        entity: Entity,
        /// Entity that dealt the lethal blow, if any
        killer: Option<Entity>,
    },

    // -------------------------------------------------------------------------
    // Lifecycle Events
    // -------------------------------------------------------------------------
    /// An entity was removed from the world.
    EntityDestroyed {
        /// The destroyed entity
        entity: Entity,
    },
}

/// Receiver of agent cues.
pub trait CueSink {
    /// Publish `cue` on behalf of `agent`
    fn emit(&mut self, agent: Entity, cue: AgentCue);
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue for tick-consistent event processing.
///
/// Events pushed during tick N are available for reading after the swap
/// that ends tick N, until the swap that ends tick N+1.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this tick
    pending: VecDeque<GameEvent>,
    /// Events from the previous tick, ready for processing
    processing: VecDeque<GameEvent>,
}

impl EventQueue {
    /// Default initial capacity for event queues.
    const DEFAULT_CAPACITY: usize = 64;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with specified initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event to be processed after the next swap.
    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    /// Swap the pending and processing queues.
    ///
    /// The simulation calls this once at the end of every tick.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over events from the previous tick.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.processing.iter()
    }

    /// Cues emitted by `agent` during the previous tick, in order
    pub fn cues_for(&self, agent: Entity) -> impl Iterator<Item = AgentCue> + '_ {
        self.processing.iter().filter_map(move |event| match event {
            GameEvent::Cue { agent: a, cue } if *a == agent => Some(*cue),
            _ => None,
        })
    }

    /// Drain all events from the previous tick.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.processing.drain(..)
    }

    /// Check if there are any events to process.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Get the number of events ready for processing.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Get the number of events pending for the next swap.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Clear all events (both pending and processing).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CueSink for EventQueue {
    fn emit(&mut self, agent: Entity, cue: AgentCue) {
        self.push(GameEvent::Cue { agent, cue });
    }
}

// ============================================================================
// Tests
// ============================================================================
