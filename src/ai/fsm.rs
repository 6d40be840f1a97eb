//! Finite State Machine for melee agent behavior
//!
//! The agent is always in exactly one [`AgentState`]. Transitions are checked
//! against a fixed table and every genuine change yields the entry effects of
//! the new state, which the agent then carries out. The machine itself never
//! touches the world, so it can be driven and inspected in isolation.
//!
//! # Example
//!
//! ```ignore
//! let mut fsm = StateMachine::new();
//! for effect in fsm.request(AgentState::Chasing) {
//!     agent.apply_entry_effect(effect);
//! }
//! assert!(fsm.is_in_state(AgentState::Chasing));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::ClipCategory;

// ============================================================================
// States
// ============================================================================

/// Behavioral state of a melee agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AgentState {
    /// Standing around, waiting to notice a target
    #[default]
    Idle,
    /// Pursuing a visible target
    Chasing,
    /// In range, swinging on a cadence
    Attacking,
    /// Terminal
    Dead,
}

impl AgentState {
    /// State name for debugging and logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Chasing => "Chasing",
            Self::Attacking => "Attacking",
            Self::Dead => "Dead",
        }
    }

    /// Whether the transition table allows `self -> to`.
    ///
    /// Self-transitions are not listed; the machine treats them as no-ops.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        use AgentState::{Attacking, Chasing, Dead, Idle};
        matches!(
            (self, to),
            (Idle, Chasing)
                | (Idle, Dead)
                | (Chasing, Idle)
                | (Chasing, Attacking)
                | (Chasing, Dead)
                | (Attacking, Idle)
                | (Attacking, Chasing)
                | (Attacking, Dead)
        )
    }

    /// Side effects run once on entering this state.
    #[must_use]
    pub fn entry_effects(self) -> EntryEffects {
        let effects: &[EntryEffect] = match self {
            Self::Idle => &[
                EntryEffect::StopMovement,
                EntryEffect::RescheduleIdleVariety,
                EntryEffect::PlayClip(ClipCategory::Idle),
            ],
            Self::Chasing => &[
                EntryEffect::ResumeMovement,
                EntryEffect::PlayClip(ClipCategory::Chase),
            ],
            Self::Attacking => &[
                EntryEffect::HaltMovement,
                EntryEffect::PlayClip(ClipCategory::Attack),
            ],
            Self::Dead => &[EntryEffect::DeathSequence],
        };
        effects.iter().copied().collect()
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Entry Effects
// ============================================================================

/// One side effect of entering a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryEffect {
    /// Tell the planner to stop
    StopMovement,
    /// Tell the planner to resume
    ResumeMovement,
    /// Stop, drop the path and zero the commanded velocity
    HaltMovement,
    /// Push the next idle variety deadline out
    RescheduleIdleVariety,
    /// Ask the host to play a clip of this category
    PlayClip(ClipCategory),
    /// Run the one-shot death sequence
    DeathSequence,
}

/// Entry effects of a single transition
pub type EntryEffects = SmallVec<[EntryEffect; 4]>;

/// Outcome of a transition request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Already in the requested state
    Unchanged,
    /// Not in the transition table
    Rejected { from: AgentState, to: AgentState },
    /// State changed; run these effects
    Changed {
        from: AgentState,
        to: AgentState,
        effects: EntryEffects,
    },
}

impl Transition {
    /// Effects to run (empty unless the state changed)
    #[must_use]
    pub fn into_effects(self) -> EntryEffects {
        match self {
            Self::Changed { effects, .. } => effects,
            Self::Unchanged | Self::Rejected { .. } => EntryEffects::new(),
        }
    }

    #[must_use]
    pub fn changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// Holder of the canonical agent state.
#[derive(Clone, PartialEq, Eq)]
pub struct StateMachine {
    /// Current active state
    current: AgentState,
    /// Number of genuine transitions so far
    transitions: u32,
}

impl StateMachine {
    /// Create a state machine in [`AgentState::Idle`].
    ///
    /// No entry effects are produced for the initial state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: AgentState::Idle,
            transitions: 0,
        }
    }

    /// Request a move to `to`.
    ///
    /// Requesting the current state is a no-op; requests outside the table
    /// (anything leaving Dead, Idle to Attacking) are rejected.
    pub fn request(&mut self, to: AgentState) -> Transition {
        let from = self.current;
        if from == to {
            return Transition::Unchanged;
        }
        if !from.can_transition_to(to) {
            log::trace!("Rejected transition {from} -> {to}");
            return Transition::Rejected { from, to };
        }

        self.current = to;
        self.transitions += 1;
        log::debug!("Agent state {from} -> {to}");

        Transition::Changed {
            from,
            to,
            effects: to.entry_effects(),
        }
    }

    /// Current state
    #[must_use]
    pub fn current(&self) -> AgentState {
        self.current
    }

    /// Get the name of the current state.
    #[must_use]
    pub fn current_state_name(&self) -> &'static str {
        self.current.name()
    }

    /// Check if the FSM is in the given state.
    #[must_use]
    pub fn is_in_state(&self, state: AgentState) -> bool {
        self.current == state
    }

    /// Whether the terminal state has been reached
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current == AgentState::Dead
    }

    /// Number of genuine transitions taken
    #[must_use]
    pub fn transition_count(&self) -> u32 {
        self.transitions
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current.name())
            .field("transitions", &self.transitions)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AgentState; 4] = [
        AgentState::Idle,
        AgentState::Chasing,
        AgentState::Attacking,
        AgentState::Dead,
    ];

    #[test]
    fn test_fsm_initial_state() {
        let fsm = StateMachine::new();
        assert_eq!(fsm.current_state_name(), "Idle");
        assert_eq!(fsm.transition_count(), 0);
    }

    #[test]
    fn test_same_state_is_noop() {
        let mut fsm = StateMachine::new();
        assert_eq!(fsm.request(AgentState::Idle), Transition::Unchanged);
        assert!(fsm.request(AgentState::Chasing).changed());
        assert!(fsm.request(AgentState::Chasing).into_effects().is_empty());
        assert_eq!(fsm.transition_count(), 1);
    }

    #[test]
    fn test_idle_cannot_jump_to_attacking() {
        let mut fsm = StateMachine::new();
        assert_eq!(
            fsm.request(AgentState::Attacking),
            Transition::Rejected {
                from: AgentState::Idle,
                to: AgentState::Attacking
            }
        );
        assert!(fsm.is_in_state(AgentState::Idle));
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut fsm = StateMachine::new();
        fsm.request(AgentState::Chasing);
        fsm.request(AgentState::Dead);

        for state in ALL {
            assert!(!fsm.request(state).changed());
        }
        assert!(fsm.is_dead());
    }

    #[test]
    fn test_every_live_state_can_die() {
        for from in [AgentState::Idle, AgentState::Chasing, AgentState::Attacking] {
            assert!(from.can_transition_to(AgentState::Dead));
        }
    }

    #[test]
    fn test_chase_attack_cycle_effects() {
        let mut fsm = StateMachine::new();

        let effects = fsm.request(AgentState::Chasing).into_effects();
        assert_eq!(
            effects.as_slice(),
            &[
                EntryEffect::ResumeMovement,
                EntryEffect::PlayClip(ClipCategory::Chase)
            ]
        );

        let effects = fsm.request(AgentState::Attacking).into_effects();
        assert_eq!(
            effects.as_slice(),
            &[
                EntryEffect::HaltMovement,
                EntryEffect::PlayClip(ClipCategory::Attack)
            ]
        );

        let effects = fsm.request(AgentState::Idle).into_effects();
        assert_eq!(effects[0], EntryEffect::StopMovement);
        assert!(effects.contains(&EntryEffect::RescheduleIdleVariety));

        let effects = fsm.request(AgentState::Dead).into_effects();
        assert_eq!(effects.as_slice(), &[EntryEffect::DeathSequence]);
    }
}
