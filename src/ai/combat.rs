//! Combat controller: attack cadence, variant choice, and hit resolution

use glam::Vec3;
use hecs::Entity;
use rand::{Rng, RngCore};
use rustc_hash::FxHashSet;

use super::config::AgentConfig;
use crate::combat::DamageSink;
use crate::core::{AgentCue, CueSink};
use crate::ecs::Transform;
use crate::physics::WorldQuery;

/// Default hit sphere center: one meter ahead, half a meter up
const DEFAULT_ATTACK_OFFSET: Vec3 = Vec3::new(0.0, 0.5, -1.0);

/// Result of one executed attack
#[derive(Debug, Clone, PartialEq)]
pub struct AttackReport {
    /// Animation variant chosen
    pub variant: u32,
    /// Entities damage was delivered to
    pub hits: Vec<Entity>,
}

/// Attack timing state for one agent
#[derive(Debug, Clone)]
pub struct CombatController {
    next_attack_time: f32,
    attacks_executed: u32,
}

impl CombatController {
    /// First attack becomes available at `ready_at`
    #[must_use]
    pub fn new(ready_at: f32) -> Self {
        Self {
            next_attack_time: ready_at,
            attacks_executed: 0,
        }
    }

    #[must_use]
    pub fn is_ready(&self, now: f32) -> bool {
        now >= self.next_attack_time
    }

    /// Consume the cadence slot if it is due. Returns whether an attack may fire.
    pub fn try_begin_attack(&mut self, now: f32, time_between_attacks: f32) -> bool {
        if !self.is_ready(now) {
            return false;
        }
        self.next_attack_time = now + time_between_attacks;
        self.attacks_executed += 1;
        true
    }

    #[must_use]
    pub fn next_attack_time(&self) -> f32 {
        self.next_attack_time
    }

    #[must_use]
    pub fn attacks_executed(&self) -> u32 {
        self.attacks_executed
    }
}

/// World-space center of the hit sphere
#[must_use]
pub fn attack_origin(config: &AgentConfig, transform: &Transform) -> Vec3 {
    transform.transform_point(config.attack_point.unwrap_or(DEFAULT_ATTACK_OFFSET))
}

/// Everything an attack needs from the outside world
pub struct AttackContext<'a> {
    pub attacker: Entity,
    pub transform: &'a Transform,
    /// Attacker is alive and still has a target
    pub can_damage: bool,
    pub query: &'a dyn WorldQuery,
    pub cues: &'a mut dyn CueSink,
    pub damage: &'a mut dyn DamageSink,
    pub rng: &'a mut dyn RngCore,
}

/// Play one attack and resolve its hits immediately.
///
/// Every distinct entity overlapping the hit sphere on `target_layers` takes
/// `damage_per_hit` once. The attacker never hits itself.
pub fn execute_attack(config: &AgentConfig, ctx: AttackContext<'_>) -> AttackReport {
    let variant = ctx.rng.gen_range(0..config.attack_variants.max(1));
    ctx.cues.emit(ctx.attacker, AgentCue::AttackIndex(variant));
    ctx.cues.emit(ctx.attacker, AgentCue::AttackTriggered);

    let mut hits = Vec::new();
    if !ctx.can_damage {
        return AttackReport { variant, hits };
    }

    let origin = attack_origin(config, ctx.transform);
    let mut seen = FxHashSet::default();
    for entity in ctx
        .query
        .overlap_sphere(origin, config.attack_radius, config.target_layers)
    {
        if entity == ctx.attacker || !seen.insert(entity) {
            continue;
        }
        if ctx.damage.apply_damage(entity, config.damage_per_hit, ctx.attacker) {
            hits.push(entity);
        }
    }

    log::trace!(
        "Attack variant {variant} from {:?} hit {} target(s)",
        ctx.attacker,
        hits.len()
    );

    AttackReport { variant, hits }
}
