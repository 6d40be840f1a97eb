//! Melee agent component
//!
//! [`Agent`] owns the canonical behavioral state of one enemy and runs the
//! per-tick decision procedure. Everything it touches outside itself arrives
//! through a [`TickContext`] (or a [`DamageContext`] for inbound damage), so
//! the agent can be driven by the full simulation or by test doubles.

use glam::Vec3;
use hecs::Entity;
use rand::RngCore;

use super::combat::{AttackContext, AttackReport, CombatController, execute_attack};
use super::config::AgentConfig;
use super::fsm::{AgentState, EntryEffect, StateMachine};
use super::idle::IdleVarietyScheduler;
use super::locomotion::{LocomotionBridge, PathPlanner, face_towards};
use super::perception::{
    SceneGraph, TargetDiscovery, TargetFix, can_see_target, is_target_detected,
    should_lose_interest,
};
use crate::combat::{DamageOutcome, DamageSink, Damageable, Health};
use crate::core::{AgentCue, ClipCategory, CueSink};
use crate::ecs::Transform;
use crate::physics::WorldQuery;

/// Planar speeds at or below this count as standing still
const MOVING_SPEED_THRESHOLD: f32 = 0.1;

/// Host services needed when an agent dies.
pub trait EntityLifecycle {
    /// Make every collider of `entity` stop blocking and being hit
    fn disable_collision(&mut self, entity: Entity);
    /// Remove `entity` from the world `delay` seconds from now
    fn schedule_removal(&mut self, entity: Entity, delay: f32);
}

/// Collaborators for one agent tick
pub struct TickContext<'a> {
    /// The agent's own entity
    pub entity: Entity,
    /// Simulation time, in seconds
    pub now: f32,
    /// Seconds since the previous tick
    pub delta: f32,
    pub transform: &'a mut Transform,
    pub discovery: &'a dyn TargetDiscovery,
    pub scene: &'a dyn SceneGraph,
    pub query: &'a dyn WorldQuery,
    /// `None` when the agent has no navigation
    pub planner: Option<&'a mut dyn PathPlanner>,
    pub cues: &'a mut dyn CueSink,
    pub damage: &'a mut dyn DamageSink,
    pub rng: &'a mut dyn RngCore,
}

/// Collaborators for inbound damage
pub struct DamageContext<'a> {
    pub entity: Entity,
    pub now: f32,
    pub planner: Option<&'a mut dyn PathPlanner>,
    pub cues: &'a mut dyn CueSink,
    pub lifecycle: &'a mut dyn EntityLifecycle,
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// State change taken this tick, if any
    pub transition: Option<(AgentState, AgentState)>,
    /// Attack executed this tick, if any
    pub attack: Option<AttackReport>,
}

/// Melee enemy brain
#[derive(Debug, Clone)]
pub struct Agent {
    config: AgentConfig,
    fsm: StateMachine,
    health: Health,
    /// Non-owning; resolved through discovery on every use
    target: Option<Entity>,
    next_target_search_time: f32,
    locomotion: LocomotionBridge,
    combat: CombatController,
    idle: IdleVarietyScheduler,
    despawn_at: Option<f32>,
}

impl Agent {
    /// Spawn an agent at full health in [`AgentState::Idle`].
    ///
    /// The config is normalized here; the first target search and the first
    /// attack are both available immediately.
    pub fn new(config: AgentConfig, spawn_time: f32, rng: &mut dyn RngCore) -> Self {
        let config = config.normalized();
        let mut idle = IdleVarietyScheduler::new(
            config.idle_special_min_delay,
            config.idle_special_max_delay,
            config.idle_variants,
        );
        idle.reschedule(spawn_time, rng);

        Self {
            health: Health::new(config.max_health),
            fsm: StateMachine::new(),
            target: None,
            next_target_search_time: spawn_time,
            locomotion: LocomotionBridge::new(config.path_update_interval),
            combat: CombatController::new(spawn_time),
            idle,
            despawn_at: None,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> AgentState {
        self.fsm.current()
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.fsm.is_dead()
    }

    #[must_use]
    pub fn health(&self) -> &Health {
        &self.health
    }

    #[must_use]
    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    /// Hand the agent a target directly (ignored once dead)
    pub fn set_target(&mut self, target: Option<Entity>) {
        if !self.is_dead() {
            self.target = target;
        }
    }

    /// When the host should remove the agent, once dead
    #[must_use]
    pub fn despawn_at(&self) -> Option<f32> {
        self.despawn_at
    }

    #[must_use]
    pub fn combat(&self) -> &CombatController {
        &self.combat
    }

    #[must_use]
    pub fn idle(&self) -> &IdleVarietyScheduler {
        &self.idle
    }

    /// Run one decision step. Does nothing once dead.
    pub fn tick(&mut self, ctx: TickContext<'_>) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.is_dead() {
            return outcome;
        }

        let TickContext {
            entity,
            now,
            delta,
            transform,
            discovery,
            scene,
            query,
            mut planner,
            cues,
            damage,
            rng,
        } = ctx;

        let fix = self.resolve_target(now, transform.position, discovery);

        match self.fsm.current() {
            AgentState::Idle => {
                let detected = is_target_detected(&self.config, fix.as_ref());
                if detected
                    && can_see_target(&self.config, entity, transform, fix.as_ref(), query, scene)
                {
                    outcome.transition =
                        self.change_state(AgentState::Chasing, entity, now, &mut planner, cues, rng);
                } else {
                    if let Some(p) = planner.as_deref_mut() {
                        LocomotionBridge::stop(p);
                    }
                    let moving = LocomotionBridge::speed(planner.as_deref()) > MOVING_SPEED_THRESHOLD;
                    if let Some(variant) = self.idle.tick(now, moving, rng) {
                        cues.emit(entity, AgentCue::IdleVariant(variant));
                    }
                }
            }
            AgentState::Chasing => {
                let visible =
                    can_see_target(&self.config, entity, transform, fix.as_ref(), query, scene);
                match fix {
                    Some(target) if !should_lose_interest(&self.config, Some(&target), visible) => {
                        if target.distance <= self.config.attack_range {
                            outcome.transition = self.change_state(
                                AgentState::Attacking,
                                entity,
                                now,
                                &mut planner,
                                cues,
                                rng,
                            );
                        } else {
                            if let Some(p) = planner.as_deref_mut() {
                                self.locomotion.request_destination(p, target.position, now);
                                LocomotionBridge::resume(p);
                            }
                            face_towards(transform, target.position, self.config.rotation_speed, delta);
                        }
                    }
                    _ => {
                        outcome.transition =
                            self.change_state(AgentState::Idle, entity, now, &mut planner, cues, rng);
                    }
                }
            }
            AgentState::Attacking => match fix {
                None => {
                    outcome.transition =
                        self.change_state(AgentState::Idle, entity, now, &mut planner, cues, rng);
                }
                Some(target) if target.distance > self.config.attack_exit_range() => {
                    outcome.transition =
                        self.change_state(AgentState::Chasing, entity, now, &mut planner, cues, rng);
                }
                Some(target) => {
                    if let Some(p) = planner.as_deref_mut() {
                        LocomotionBridge::halt(p);
                    }
                    face_towards(transform, target.position, self.config.rotation_speed, delta);

                    if self
                        .combat
                        .try_begin_attack(now, self.config.time_between_attacks)
                    {
                        outcome.attack = Some(execute_attack(
                            &self.config,
                            AttackContext {
                                attacker: entity,
                                transform,
                                can_damage: !self.is_dead() && self.target.is_some(),
                                query,
                                cues: &mut *cues,
                                damage,
                                rng: &mut *rng,
                            },
                        ));
                    }
                }
            },
            AgentState::Dead => return outcome,
        }

        cues.emit(
            entity,
            AgentCue::MoveSpeed(LocomotionBridge::speed(planner.as_deref())),
        );
        cues.emit(
            entity,
            AgentCue::Attacking(self.fsm.is_in_state(AgentState::Attacking)),
        );

        outcome
    }

    /// Take damage. A lethal hit runs the death sequence before returning.
    pub fn apply_damage(&mut self, amount: f32, ctx: DamageContext<'_>) -> DamageOutcome {
        if self.is_dead() {
            return DamageOutcome::Ignored;
        }

        let DamageContext {
            entity,
            now,
            mut planner,
            cues,
            lifecycle,
        } = ctx;

        let outcome = self.health.apply_damage(amount);
        match outcome {
            DamageOutcome::Ignored => {}
            DamageOutcome::Hurt { .. } => {
                cues.emit(entity, AgentCue::PlayClip(ClipCategory::Hurt));
                cues.emit(entity, AgentCue::HitReaction);
            }
            DamageOutcome::Killed => {
                cues.emit(entity, AgentCue::PlayClip(ClipCategory::Hurt));
                let effects = self.fsm.request(AgentState::Dead).into_effects();
                if effects.contains(&EntryEffect::DeathSequence) {
                    self.run_death_sequence(entity, now, &mut planner, cues, lifecycle);
                }
            }
        }
        outcome
    }

    /// Look up the stored target, or search for one when the throttle allows
    fn resolve_target(
        &mut self,
        now: f32,
        position: Vec3,
        discovery: &dyn TargetDiscovery,
    ) -> Option<TargetFix> {
        if let Some(target) = self.target {
            match discovery.locate(target) {
                Some(at) => return Some(TargetFix::new(target, at, position)),
                None => {
                    log::debug!("Target {target:?} no longer resolves; dropping it");
                    self.target = None;
                }
            }
        }

        if now < self.next_target_search_time {
            return None;
        }
        self.next_target_search_time = now + self.config.target_search_interval;

        let found = discovery.find_by_tag(&self.config.target_tag)?;
        let at = discovery.locate(found)?;
        self.target = Some(found);
        Some(TargetFix::new(found, at, position))
    }

    fn change_state<'p>(
        &mut self,
        to: AgentState,
        entity: Entity,
        now: f32,
        planner: &mut Option<&'p mut dyn PathPlanner>,
        cues: &mut dyn CueSink,
        rng: &mut dyn RngCore,
    ) -> Option<(AgentState, AgentState)> {
        let from = self.fsm.current();
        let effects = self.fsm.request(to).into_effects();
        if effects.is_empty() {
            return None;
        }

        for effect in effects {
            match effect {
                EntryEffect::StopMovement => {
                    if let Some(p) = planner.as_deref_mut() {
                        LocomotionBridge::stop(p);
                    }
                }
                EntryEffect::ResumeMovement => {
                    if let Some(p) = planner.as_deref_mut() {
                        LocomotionBridge::resume(p);
                    }
                }
                EntryEffect::HaltMovement => {
                    if let Some(p) = planner.as_deref_mut() {
                        LocomotionBridge::halt(p);
                    }
                }
                EntryEffect::RescheduleIdleVariety => self.idle.reschedule(now, rng),
                EntryEffect::PlayClip(category) => cues.emit(entity, AgentCue::PlayClip(category)),
                // Only reachable through apply_damage
                EntryEffect::DeathSequence => {}
            }
        }

        Some((from, to))
    }

    fn run_death_sequence<'p>(
        &mut self,
        entity: Entity,
        now: f32,
        planner: &mut Option<&'p mut dyn PathPlanner>,
        cues: &mut dyn CueSink,
        lifecycle: &mut dyn EntityLifecycle,
    ) {
        if let Some(p) = planner.as_deref_mut() {
            p.stop();
            p.reset_path();
            p.set_enabled(false);
        }
        lifecycle.disable_collision(entity);

        cues.emit(entity, AgentCue::Dead(true));
        cues.emit(entity, AgentCue::DeathTriggered);
        cues.emit(entity, AgentCue::PlayClip(ClipCategory::Death));

        let delay = self.config.death_destroy_delay;
        lifecycle.schedule_removal(entity, delay);
        self.despawn_at = Some(now + delay);
        self.target = None;

        log::info!("Agent {entity:?} died; removal in {delay:.1}s");
    }
}
