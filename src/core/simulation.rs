//! Headless simulation host
//!
//! Owns the ECS world, the physics world and the event queue, and provides
//! every service an [`Agent`] expects from its surroundings: target discovery,
//! world queries, path planning, cue delivery, damage routing and delayed
//! removal of dead entities.

use glam::{Quat, Vec3};
use hecs::Entity;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::events::{EventQueue, GameEvent};
use super::scenario::{AgentSpawn, ObstacleSpawn, Scenario, TargetSpawn};
use super::stats::RosterStats;
use super::time::Time;
use crate::ai::{
    Agent, AgentConfig, AgentState, DamageContext, EntityLifecycle, PathPlanner, SteeringPlanner,
    TickContext,
};
use crate::combat::{DamageBuffer, DamageOutcome, Damageable, Health};
use crate::ecs::{Name, Tag, Transform, World};
use crate::physics::{ColliderOptions, ColliderShape, Physics, PhysicsBody, layers};

/// Capsule used for agents and targets: 1.8 m tall, 0.4 m radius
const BODY_SHAPE: ColliderShape = ColliderShape::Capsule {
    half_height: 0.5,
    radius: 0.4,
};

/// Capsule center above the entity's base
const BODY_CENTER: Vec3 = Vec3::new(0.0, 0.9, 0.0);

/// Removal deadline for an entity, in simulation seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DespawnAfter(pub f32);

/// Scripted walk through a list of waypoints
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedPath {
    points: Vec<Vec3>,
    speed: f32,
    next: usize,
}

impl ScriptedPath {
    pub fn new(points: Vec<Vec3>, speed: f32) -> Self {
        Self {
            points,
            speed: speed.max(0.0),
            next: 0,
        }
    }

    /// Walk toward the current waypoint; stays put after the last one
    pub fn advance(&mut self, position: &mut Vec3, dt: f32) {
        let mut budget = self.speed * dt;
        while budget > 0.0 {
            let Some(&waypoint) = self.points.get(self.next) else {
                return;
            };
            let to_waypoint = waypoint - *position;
            let distance = to_waypoint.length();
            if distance <= budget {
                *position = waypoint;
                budget -= distance;
                self.next += 1;
            } else {
                *position += to_waypoint / distance * budget;
                budget = 0.0;
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.points.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LifecycleCommand {
    DisableCollision(Entity),
    ScheduleRemoval(Entity, f32),
}

/// Lifecycle requests collected while an agent is borrowed
#[derive(Debug, Default)]
struct LifecycleCommands {
    queue: Vec<LifecycleCommand>,
}

impl EntityLifecycle for LifecycleCommands {
    fn disable_collision(&mut self, entity: Entity) {
        self.queue.push(LifecycleCommand::DisableCollision(entity));
    }

    fn schedule_removal(&mut self, entity: Entity, delay: f32) {
        self.queue
            .push(LifecycleCommand::ScheduleRemoval(entity, delay));
    }
}

/// Headless fixed-step world hosting melee agents
pub struct Simulation {
    /// Time tracking
    pub time: Time,
    /// ECS world
    pub world: World,
    /// Physics world
    pub physics: Physics,
    /// Cues and simulation events from the previous tick
    pub events: EventQueue,
    /// Enemy spawn/kill counters
    pub roster: RosterStats,
    rng: ChaCha8Rng,
    damage: DamageBuffer,
    commands: LifecycleCommands,
}

impl Simulation {
    /// Create an empty simulation with a seeded RNG
    pub fn new(seed: u64) -> Self {
        Self {
            time: Time::new(),
            world: World::new(),
            physics: Physics::new(),
            events: EventQueue::new(),
            roster: RosterStats::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            damage: DamageBuffer::new(),
            commands: LifecycleCommands::default(),
        }
    }

    /// Build a simulation populated from a scenario
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let mut sim = Self::new(scenario.seed);
        for obstacle in &scenario.obstacles {
            sim.spawn_obstacle_from(obstacle);
        }
        for target in &scenario.targets {
            sim.spawn_target_from(target);
        }
        for agent in &scenario.agents {
            sim.spawn_agent_from(agent);
        }
        log::info!(
            "Loaded scenario '{}' ({} entities)",
            scenario.name,
            scenario.entity_count()
        );
        sim
    }

    // ========================================================================
    // Spawning
    // ========================================================================

    /// Spawn an enemy agent
    pub fn spawn_agent(&mut self, position: Vec3, yaw: f32, config: AgentConfig) -> Entity {
        let now = self.time.elapsed();
        let agent = Agent::new(config, now, &mut self.rng);
        let planner =
            SteeringPlanner::new(agent.config().move_speed, agent.config().stopping_distance);
        let transform = Transform::from_position_yaw(position, yaw);

        let entity = self.world.spawn((transform, agent, planner));
        let body = self.physics.create_kinematic_body(position, transform.rotation);
        self.physics.add_collider(
            body,
            BODY_SHAPE,
            ColliderOptions::solid(entity, layers::ENEMY).with_offset(BODY_CENTER),
        );
        self.insert(entity, PhysicsBody(body));
        self.physics.update_queries();

        self.roster.record_spawn();
        log::info!("Spawned agent {entity:?} at {position}");
        entity
    }

    /// Spawn a tagged, damageable target
    pub fn spawn_target(&mut self, position: Vec3, tag: &str, health: Health) -> Entity {
        let entity = self
            .world
            .spawn((Transform::from_position(position), Tag::new(tag), health));
        let body = self.physics.create_kinematic_body(position, Quat::IDENTITY);
        self.physics.add_collider(
            body,
            BODY_SHAPE,
            ColliderOptions::solid(entity, layers::PLAYER).with_offset(BODY_CENTER),
        );
        self.insert(entity, PhysicsBody(body));
        self.physics.update_queries();

        log::debug!("Spawned target {entity:?} ({tag}) at {position}");
        entity
    }

    /// Spawn a static sight-blocking box
    pub fn spawn_obstacle(&mut self, position: Vec3, half_extents: Vec3, yaw: f32) -> Entity {
        let transform = Transform::from_position_yaw(position, yaw);
        let entity = self.world.spawn((transform,));
        let body = self.physics.create_static_body(position, transform.rotation);
        self.physics.add_collider(
            body,
            ColliderShape::Box { half_extents },
            ColliderOptions::solid(entity, layers::OBSTACLE),
        );
        self.insert(entity, PhysicsBody(body));
        self.physics.update_queries();
        entity
    }

    /// Spawn a child entity of `parent` with its own collider on `parent`'s body.
    ///
    /// Sight probes that strike the child count as striking the parent.
    pub fn attach_child_collider(
        &mut self,
        parent: Entity,
        shape: ColliderShape,
        offset: Vec3,
        layer_bits: u32,
    ) -> Option<Entity> {
        let body = self.world.get::<PhysicsBody>(parent).ok().map(|b| b.0)?;
        let position = self.world.position(parent)?;
        let child = self.world.spawn((Transform::from_position(position + offset),));
        self.world.attach(parent, child).ok()?;
        self.physics.add_collider(
            body,
            shape,
            ColliderOptions::solid(child, layer_bits).with_offset(offset),
        );
        self.physics.update_queries();
        Some(child)
    }

    fn spawn_agent_from(&mut self, spawn: &AgentSpawn) -> Entity {
        let entity = self.spawn_agent(spawn.position, spawn.yaw, spawn.config.clone());
        if let Some(name) = &spawn.name {
            self.insert(entity, Name::new(name.clone()));
        }
        entity
    }

    fn spawn_target_from(&mut self, spawn: &TargetSpawn) -> Entity {
        let mut health = Health::new(spawn.max_health);
        if spawn.destroy_on_death {
            health = health.destroy_on_death();
        }
        let entity = self.spawn_target(spawn.position, &spawn.tag, health);
        if let Some(name) = &spawn.name {
            self.insert(entity, Name::new(name.clone()));
        }
        if !spawn.path.is_empty() {
            self.insert(entity, ScriptedPath::new(spawn.path.clone(), spawn.speed));
        }
        entity
    }

    fn spawn_obstacle_from(&mut self, spawn: &ObstacleSpawn) -> Entity {
        let entity = self.spawn_obstacle(spawn.position, spawn.half_extents, spawn.yaw);
        if let Some(name) = &spawn.name {
            self.insert(entity, Name::new(name.clone()));
        }
        entity
    }

    fn insert(&mut self, entity: Entity, component: impl hecs::Component) {
        if self.world.inner.insert_one(entity, component).is_err() {
            log::warn!("Tried to add a component to missing entity {entity:?}");
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Behavioral state of an agent
    pub fn agent_state(&self, entity: Entity) -> Option<AgentState> {
        self.world.get::<Agent>(entity).ok().map(|a| a.state())
    }

    /// Current health of an agent or plain damageable entity
    pub fn health_of(&self, entity: Entity) -> Option<f32> {
        if let Ok(agent) = self.world.get::<Agent>(entity) {
            return Some(agent.health().current());
        }
        self.world.get::<Health>(entity).ok().map(|h| h.current())
    }

    /// Move an entity instantly. Its collider follows on the next step.
    pub fn teleport(&mut self, entity: Entity, position: Vec3) {
        if let Ok(mut transform) = self.world.get_mut::<Transform>(entity) {
            transform.position = position;
        }
        if let Ok(body) = self.world.get::<PhysicsBody>(entity).map(|b| b.0) {
            self.physics.set_kinematic_position(body, position);
        }
    }

    // ========================================================================
    // Damage
    // ========================================================================

    /// Route damage to `target`: agent first, then plain health.
    ///
    /// Returns the outcome, or `None` if the target can't take damage.
    pub fn apply_damage(
        &mut self,
        target: Entity,
        amount: f32,
        source: Option<Entity>,
    ) -> Option<DamageOutcome> {
        let now = self.time.elapsed();
        let mut killed_agent = false;

        let outcome = if let Ok(mut agent) = self.world.inner.get::<&mut Agent>(target) {
            let mut planner = self.world.inner.get::<&mut SteeringPlanner>(target).ok();
            let outcome = agent.apply_damage(
                amount,
                DamageContext {
                    entity: target,
                    now,
                    planner: planner.as_deref_mut().map(|p| p as &mut dyn PathPlanner),
                    cues: &mut self.events,
                    lifecycle: &mut self.commands,
                },
            );
            killed_agent = outcome == DamageOutcome::Killed;
            outcome
        } else if let Ok(mut health) = self.world.inner.get::<&mut Health>(target) {
            let receiver: &mut dyn Damageable = &mut *health;
            let outcome = receiver.apply_damage(amount);
            if outcome == DamageOutcome::Killed && health.destroy_on_death {
                self.commands.schedule_removal(target, 0.0);
            }
            outcome
        } else {
            return None;
        };

        match outcome {
            DamageOutcome::Ignored => {}
            DamageOutcome::Hurt { .. } => self.events.push(GameEvent::EntityDamaged {
                entity: target,
                amount,
                source,
            }),
            DamageOutcome::Killed => {
                self.events.push(GameEvent::EntityDamaged {
                    entity: target,
                    amount,
                    source,
                });
                self.events.push(GameEvent::EntityKilled {
                    entity: target,
                    killer: source,
                });
                log::info!("{target:?} killed by {source:?}");
            }
        }
        if killed_agent {
            self.roster.record_kill();
        }

        self.apply_lifecycle_commands();
        Some(outcome)
    }

    fn deliver_buffered_damage(&mut self) {
        let pending: Vec<_> = self.damage.drain().collect();
        for hit in pending {
            self.apply_damage(hit.target, hit.amount, Some(hit.source));
        }
    }

    fn apply_lifecycle_commands(&mut self) {
        let now = self.time.elapsed();
        let mut collision_changed = false;
        for command in std::mem::take(&mut self.commands.queue) {
            match command {
                LifecycleCommand::DisableCollision(entity) => {
                    self.physics.set_owner_collision(entity, false);
                    collision_changed = true;
                }
                LifecycleCommand::ScheduleRemoval(entity, delay) => {
                    self.insert(entity, DespawnAfter(now + delay.max(0.0)));
                }
            }
        }
        if collision_changed {
            self.physics.update_queries();
        }
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    /// Advance the simulation by one fixed step of `dt` seconds.
    ///
    /// Agents decide first (each agent's attack damage is delivered right
    /// after its own decision), then movers advance, physics steps, expired
    /// entities are removed, and the event queue swaps.
    pub fn tick(&mut self, dt: f32) {
        self.time.advance(dt);
        let now = self.time.elapsed();
        let dt = self.time.delta();

        self.tick_agents(now, dt);
        self.advance_movers(dt);
        self.physics.step(dt);
        self.remove_expired(now);

        self.events.swap();
    }

    /// Run fixed steps until `duration` seconds have elapsed. Returns the step count.
    pub fn run_for(&mut self, duration: f32, dt: f32) -> u64 {
        if dt <= 0.0 {
            return 0;
        }
        let end = self.time.elapsed() + duration;
        let mut steps = 0;
        while self.time.elapsed() + dt * 0.5 < end {
            self.tick(dt);
            steps += 1;
        }
        steps
    }

    fn tick_agents(&mut self, now: f32, dt: f32) {
        let agents: Vec<Entity> = self
            .world
            .inner
            .query::<&Agent>()
            .iter()
            .map(|(entity, _)| entity)
            .collect();

        for entity in agents {
            let Ok(mut transform) = self.world.get::<Transform>(entity).map(|t| *t) else {
                continue;
            };

            let outcome = {
                let Ok(mut agent) = self.world.inner.get::<&mut Agent>(entity) else {
                    continue;
                };
                let mut planner = self.world.inner.get::<&mut SteeringPlanner>(entity).ok();
                agent.tick(TickContext {
                    entity,
                    now,
                    delta: dt,
                    transform: &mut transform,
                    discovery: &self.world,
                    scene: &self.world,
                    query: &self.physics,
                    planner: planner.as_deref_mut().map(|p| p as &mut dyn PathPlanner),
                    cues: &mut self.events,
                    damage: &mut self.damage,
                    rng: &mut self.rng,
                })
            };

            if let Ok(mut stored) = self.world.get_mut::<Transform>(entity) {
                *stored = transform;
            }
            if let Some((from, to)) = outcome.transition {
                self.events.push(GameEvent::StateChanged {
                    agent: entity,
                    from,
                    to,
                });
            }

            self.deliver_buffered_damage();
        }
    }

    fn advance_movers(&mut self, dt: f32) {
        for (_, (transform, planner, body)) in self
            .world
            .inner
            .query_mut::<(&mut Transform, &mut SteeringPlanner, &PhysicsBody)>()
        {
            planner.advance(&mut transform.position, dt);
            self.physics.set_kinematic_position(body.0, transform.position);
        }

        for (_, (transform, path, body)) in self
            .world
            .inner
            .query_mut::<(&mut Transform, &mut ScriptedPath, &PhysicsBody)>()
        {
            if !path.is_finished() {
                path.advance(&mut transform.position, dt);
                self.physics.set_kinematic_position(body.0, transform.position);
            }
        }
    }

    fn remove_expired(&mut self, now: f32) {
        let expired: Vec<Entity> = self
            .world
            .inner
            .query::<&DespawnAfter>()
            .iter()
            .filter(|(_, at)| at.0 <= now)
            .map(|(entity, _)| entity)
            .collect();

        if expired.is_empty() {
            return;
        }

        for entity in expired {
            if let Ok(body) = self.world.get::<PhysicsBody>(entity).map(|b| b.0) {
                self.physics.remove_body(body);
            }
            if self.world.despawn(entity).is_ok() {
                self.events.push(GameEvent::EntityDestroyed { entity });
                log::debug!("Removed {entity:?}");
            }
        }
        self.physics.update_queries();
    }
}
