//! Test doubles for the agent's collaborators

use std::cell::RefCell;

use glam::Vec3;
use hecs::Entity;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::ai::{EntityLifecycle, PathPlanner, SceneGraph, TargetDiscovery};
use crate::combat::DamageSink;
use crate::core::{AgentCue, CueSink};
use crate::physics::{RayProbe, RaycastHit, WorldQuery};

/// Deterministic RNG for tests
pub fn test_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(7)
}

#[derive(Debug, Default)]
struct MockEntity {
    position: Vec3,
    tag: Option<String>,
    parent: Option<Entity>,
}

/// Discovery and hierarchy backed by plain maps
#[derive(Default)]
pub struct MockWorld {
    ids: hecs::World,
    entities: FxHashMap<Entity, MockEntity>,
    order: Vec<Entity>,
}

impl MockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_entity(&mut self) -> Entity {
        let entity = self.ids.spawn(());
        self.entities.insert(entity, MockEntity::default());
        self.order.push(entity);
        entity
    }

    pub fn place(&mut self, entity: Entity, position: Vec3) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.position = position;
        }
    }

    pub fn tag(&mut self, entity: Entity, tag: &str) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.tag = Some(tag.to_string());
        }
    }

    pub fn untag(&mut self, entity: Entity) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.tag = None;
        }
    }

    pub fn set_parent(&mut self, child: Entity, parent: Entity) {
        if let Some(e) = self.entities.get_mut(&child) {
            e.parent = Some(parent);
        }
    }

    /// Forget an entity entirely (despawned or dead)
    pub fn remove(&mut self, entity: Entity) {
        self.entities.remove(&entity);
        self.order.retain(|&e| e != entity);
    }
}

impl TargetDiscovery for MockWorld {
    fn find_by_tag(&self, tag: &str) -> Option<Entity> {
        self.order.iter().copied().find(|e| {
            self.entities
                .get(e)
                .and_then(|m| m.tag.as_deref())
                .is_some_and(|t| t == tag)
        })
    }

    fn locate(&self, entity: Entity) -> Option<Vec3> {
        self.entities.get(&entity).map(|m| m.position)
    }
}

impl SceneGraph for MockWorld {
    fn is_self_or_descendant(&self, entity: Entity, ancestor: Entity) -> bool {
        let mut current = Some(entity);
        while let Some(e) = current {
            if e == ancestor {
                return true;
            }
            current = self.entities.get(&e).and_then(|m| m.parent);
        }
        false
    }
}

/// World query with canned answers that records every probe
#[derive(Default)]
pub struct MockQuery {
    pub hit: Option<RaycastHit>,
    pub overlaps: Vec<Entity>,
    probes: RefCell<Vec<RayProbe>>,
}

impl MockQuery {
    pub fn with_hit(mut self, entity: Option<Entity>, layers: u32, distance: f32) -> Self {
        self.hit = Some(RaycastHit {
            entity,
            layers,
            point: Vec3::ZERO,
            distance,
        });
        self
    }

    pub fn with_overlaps(mut self, overlaps: Vec<Entity>) -> Self {
        self.overlaps = overlaps;
        self
    }

    pub fn probes(&self) -> Vec<RayProbe> {
        self.probes.borrow().clone()
    }
}

impl WorldQuery for MockQuery {
    fn raycast(&self, probe: &RayProbe) -> Option<RaycastHit> {
        self.probes.borrow_mut().push(*probe);
        self.hit.clone()
    }

    fn overlap_sphere(&self, _center: Vec3, _radius: f32, _layer_mask: u32) -> Vec<Entity> {
        self.overlaps.clone()
    }
}

/// Cue sink that keeps everything in order
#[derive(Debug, Default)]
pub struct RecordingCues {
    pub cues: Vec<(Entity, AgentCue)>,
}

impl RecordingCues {
    pub fn for_agent(&self, agent: Entity) -> Vec<AgentCue> {
        self.cues
            .iter()
            .filter(|(a, _)| *a == agent)
            .map(|(_, c)| *c)
            .collect()
    }

    pub fn last_for(&self, agent: Entity) -> Option<AgentCue> {
        self.for_agent(agent).last().copied()
    }

    pub fn clear(&mut self) {
        self.cues.clear();
    }
}

impl CueSink for RecordingCues {
    fn emit(&mut self, agent: Entity, cue: AgentCue) {
        self.cues.push((agent, cue));
    }
}

/// Damage sink that records calls and accepts a fixed set of receivers
#[derive(Debug, Default)]
pub struct RecordingDamage {
    pub calls: Vec<(Entity, f32, Entity)>,
    accepted: FxHashSet<Entity>,
}

impl RecordingDamage {
    pub fn accepting(targets: impl IntoIterator<Item = Entity>) -> Self {
        Self {
            calls: Vec::new(),
            accepted: targets.into_iter().collect(),
        }
    }
}

impl DamageSink for RecordingDamage {
    fn apply_damage(&mut self, target: Entity, amount: f32, source: Entity) -> bool {
        self.calls.push((target, amount, source));
        self.accepted.contains(&target)
    }
}

/// Planner that records commands; `stop` zeroes the reported velocity
#[derive(Debug)]
pub struct MockPlanner {
    pub destinations: Vec<Vec3>,
    pub velocity: Vec3,
    pub enabled: bool,
    pub stopped: bool,
    pub stop_calls: u32,
    pub resume_calls: u32,
    pub reset_calls: u32,
}

impl Default for MockPlanner {
    fn default() -> Self {
        Self {
            destinations: Vec::new(),
            velocity: Vec3::ZERO,
            enabled: true,
            stopped: false,
            stop_calls: 0,
            resume_calls: 0,
            reset_calls: 0,
        }
    }
}

impl PathPlanner for MockPlanner {
    fn set_destination(&mut self, destination: Vec3) {
        self.destinations.push(destination);
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.velocity = Vec3::ZERO;
        self.stop_calls += 1;
    }

    fn resume(&mut self) {
        self.stopped = false;
        self.resume_calls += 1;
    }

    fn reset_path(&mut self) {
        self.reset_calls += 1;
    }

    fn current_velocity(&self) -> Vec3 {
        self.velocity
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Lifecycle service that records requests
#[derive(Debug, Default)]
pub struct RecordingLifecycle {
    pub disabled: Vec<Entity>,
    pub removals: Vec<(Entity, f32)>,
}

impl EntityLifecycle for RecordingLifecycle {
    fn disable_collision(&mut self, entity: Entity) {
        self.disabled.push(entity);
    }

    fn schedule_removal(&mut self, entity: Entity, delay: f32) {
        self.removals.push((entity, delay));
    }
}
