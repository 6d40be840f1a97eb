//! Physics world using rapier3d
//!
//! Bodies carry the colliders; each collider records the ECS entity that owns
//! it (in rapier's `user_data`) and its layer bits (as collision group
//! memberships), which is all the agent's queries need to classify hits.

use glam::{Quat, Vec3};
use hecs::Entity;
use rapier3d::na::{self, UnitQuaternion};
use rapier3d::parry::shape::Ball;
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use super::query::{RayProbe, RaycastHit, WorldQuery};

/// Handle to a rigid body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RigidBodyHandle(pub rapier3d::dynamics::RigidBodyHandle);

/// Handle to a collider in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub rapier3d::geometry::ColliderHandle);

/// ECS component linking an entity to its rigid body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody(pub RigidBodyHandle);

/// Collider geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Axis-aligned box (in body space) with the given half extents
    Box { half_extents: Vec3 },
    /// Sphere
    Sphere { radius: f32 },
    /// Upright capsule
    Capsule { half_height: f32, radius: f32 },
}

/// Per-collider settings
#[derive(Debug, Clone, Copy)]
pub struct ColliderOptions {
    /// Entity that owns this collider
    pub owner: Entity,
    /// Layer bits this collider belongs to
    pub layers: u32,
    /// Sensor colliders are trigger-only and invisible to queries
    pub sensor: bool,
    /// Offset from the body origin
    pub offset: Vec3,
}

impl ColliderOptions {
    /// Solid collider on the given layers, centered on the body
    #[must_use]
    pub fn solid(owner: Entity, layers: u32) -> Self {
        Self {
            owner,
            layers,
            sensor: false,
            offset: Vec3::ZERO,
        }
    }

    /// Same options, trigger-only
    #[must_use]
    pub fn as_sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    /// Same options, offset from the body origin
    #[must_use]
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }
}

/// Convert glam Quat to rapier3d UnitQuaternion
fn quat_to_rapier(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(na::Quaternion::new(q.w, q.x, q.y, q.z))
}

fn entity_to_user_data(entity: Entity) -> u128 {
    u128::from(entity.to_bits().get())
}

fn user_data_to_entity(data: u128) -> Option<Entity> {
    u64::try_from(data).ok().and_then(Entity::from_bits)
}

/// Query groups matching colliders on any layer of `mask`
fn query_groups(mask: u32) -> InteractionGroups {
    InteractionGroups::new(Group::ALL, Group::from_bits_truncate(mask))
}

/// Physics world manager
pub struct Physics {
    /// Gravity vector
    pub gravity: Vec3,
    /// Physics pipeline
    pipeline: PhysicsPipeline,
    /// Island manager
    island_manager: IslandManager,
    /// Broad phase
    broad_phase: DefaultBroadPhase,
    /// Narrow phase
    narrow_phase: NarrowPhase,
    /// Rigid body set
    rigid_body_set: RigidBodySet,
    /// Collider set
    collider_set: ColliderSet,
    /// Impulse joint set
    impulse_joint_set: ImpulseJointSet,
    /// Multibody joint set
    multibody_joint_set: MultibodyJointSet,
    /// CCD solver
    ccd_solver: CCDSolver,
    /// Query pipeline for raycasting and overlaps
    query_pipeline: QueryPipeline,
    /// Integration parameters
    integration_parameters: IntegrationParameters,
}

impl Physics {
    /// Create a new physics world with default gravity
    pub fn new() -> Self {
        Self::with_gravity(Vec3::new(0.0, -9.81, 0.0))
    }

    /// Create a new physics world with custom gravity
    pub fn with_gravity(gravity: Vec3) -> Self {
        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
        }
    }

    /// Step the physics simulation (also refreshes the query pipeline)
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;

        self.pipeline.step(
            &vector![self.gravity.x, self.gravity.y, self.gravity.z],
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Make freshly inserted or toggled colliders visible to queries without stepping
    pub fn update_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Create a static rigid body (doesn't move)
    pub fn create_static_body(&mut self, position: Vec3, rotation: Quat) -> RigidBodyHandle {
        let isometry = Isometry::from_parts(
            na::Translation3::new(position.x, position.y, position.z),
            quat_to_rapier(rotation),
        );
        let body = RigidBodyBuilder::fixed().position(isometry).build();

        RigidBodyHandle(self.rigid_body_set.insert(body))
    }

    /// Create a kinematic rigid body (moved by the simulation, not by forces)
    pub fn create_kinematic_body(&mut self, position: Vec3, rotation: Quat) -> RigidBodyHandle {
        let isometry = Isometry::from_parts(
            na::Translation3::new(position.x, position.y, position.z),
            quat_to_rapier(rotation),
        );
        let body = RigidBodyBuilder::kinematic_position_based()
            .position(isometry)
            .build();

        RigidBodyHandle(self.rigid_body_set.insert(body))
    }

    /// Attach a collider to a rigid body
    pub fn add_collider(
        &mut self,
        body: RigidBodyHandle,
        shape: ColliderShape,
        options: ColliderOptions,
    ) -> ColliderHandle {
        let builder = match shape {
            ColliderShape::Box { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            ColliderShape::Sphere { radius } => ColliderBuilder::ball(radius),
            ColliderShape::Capsule {
                half_height,
                radius,
            } => ColliderBuilder::capsule_y(half_height, radius),
        };

        let collider = builder
            .translation(vector![options.offset.x, options.offset.y, options.offset.z])
            .collision_groups(InteractionGroups::new(
                Group::from_bits_truncate(options.layers),
                Group::ALL,
            ))
            .sensor(options.sensor)
            .user_data(entity_to_user_data(options.owner))
            .build();

        ColliderHandle(self.collider_set.insert_with_parent(
            collider,
            body.0,
            &mut self.rigid_body_set,
        ))
    }

    /// Get the position of a rigid body
    pub fn get_position(&self, body: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(body.0).map(|rb| {
            let pos = rb.translation();
            Vec3::new(pos.x, pos.y, pos.z)
        })
    }

    /// Set the position of a kinematic body (applied on the next step)
    pub fn set_kinematic_position(&mut self, body: RigidBodyHandle, position: Vec3) {
        if let Some(rb) = self.rigid_body_set.get_mut(body.0) {
            rb.set_next_kinematic_translation(vector![position.x, position.y, position.z]);
        }
    }

    /// Enable or disable every collider owned by `owner`.
    ///
    /// Returns the number of colliders touched.
    pub fn set_owner_collision(&mut self, owner: Entity, enabled: bool) -> usize {
        let tag = entity_to_user_data(owner);
        let mut touched = 0;
        for (_, collider) in self.collider_set.iter_mut() {
            if collider.user_data == tag {
                collider.set_enabled(enabled);
                touched += 1;
            }
        }
        touched
    }

    /// Remove a rigid body and its colliders
    pub fn remove_body(&mut self, body: RigidBodyHandle) {
        self.rigid_body_set.remove(
            body.0,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    /// Number of colliders in the world
    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldQuery for Physics {
    fn raycast(&self, probe: &RayProbe) -> Option<RaycastHit> {
        let direction = probe.direction.normalize_or_zero();
        if direction == Vec3::ZERO || probe.max_distance <= 0.0 {
            return None;
        }

        let ray = Ray::new(
            point![probe.origin.x, probe.origin.y, probe.origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        let ignored = probe.ignore.map(entity_to_user_data);
        let predicate = |_: rapier3d::geometry::ColliderHandle, collider: &Collider| {
            collider.is_enabled() && Some(collider.user_data) != ignored
        };
        let filter = QueryFilter::default()
            .exclude_sensors()
            .groups(query_groups(probe.layer_mask))
            .predicate(&predicate);

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                probe.max_distance,
                true,
                filter,
            )
            .and_then(|(handle, distance)| {
                let collider = self.collider_set.get(handle)?;
                let point = ray.point_at(distance);
                Some(RaycastHit {
                    entity: user_data_to_entity(collider.user_data),
                    layers: collider.collision_groups().memberships.bits(),
                    point: Vec3::new(point.x, point.y, point.z),
                    distance,
                })
            })
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, layer_mask: u32) -> Vec<Entity> {
        let mut hits = Vec::new();
        if radius <= 0.0 {
            return hits;
        }

        let shape = Ball::new(radius);
        let position = Isometry::translation(center.x, center.y, center.z);
        let predicate =
            |_: rapier3d::geometry::ColliderHandle, collider: &Collider| collider.is_enabled();
        let filter = QueryFilter::default()
            .exclude_sensors()
            .groups(query_groups(layer_mask))
            .predicate(&predicate);

        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &position,
            &shape,
            filter,
            |handle| {
                if let Some(entity) = self
                    .collider_set
                    .get(handle)
                    .and_then(|c| user_data_to_entity(c.user_data))
                {
                    hits.push(entity);
                }
                true
            },
        );

        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::layers;

    fn entity_pair() -> (hecs::World, Entity, Entity) {
        let mut world = hecs::World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        (world, a, b)
    }

    #[test]
    fn test_user_data_round_trip() {
        let (_world, a, _) = entity_pair();
        assert_eq!(user_data_to_entity(entity_to_user_data(a)), Some(a));
        assert_eq!(user_data_to_entity(0), None);
    }

    #[test]
    fn test_raycast_reports_owner_and_layers() {
        let (_world, wall, _) = entity_pair();
        let mut physics = Physics::new();
        let body = physics.create_static_body(Vec3::new(0.0, 1.0, -5.0), Quat::IDENTITY);
        physics.add_collider(
            body,
            ColliderShape::Box {
                half_extents: Vec3::new(2.0, 2.0, 0.1),
            },
            ColliderOptions::solid(wall, layers::OBSTACLE),
        );
        physics.update_queries();

        let hit = physics
            .raycast(&RayProbe {
                origin: Vec3::new(0.0, 1.0, 0.0),
                direction: Vec3::NEG_Z,
                max_distance: 10.0,
                layer_mask: layers::ALL,
                ignore: None,
            })
            .expect("wall should be hit");

        assert_eq!(hit.entity, Some(wall));
        assert_eq!(hit.layers & layers::OBSTACLE, layers::OBSTACLE);
        assert!((hit.distance - 4.9).abs() < 0.01);
    }

    #[test]
    fn test_raycast_ignores_sensors_and_owner() {
        let (_world, observer, volume) = entity_pair();
        let mut physics = Physics::new();

        let own = physics.create_static_body(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY);
        physics.add_collider(
            own,
            ColliderShape::Capsule {
                half_height: 0.5,
                radius: 0.4,
            },
            ColliderOptions::solid(observer, layers::ENEMY),
        );

        let trigger = physics.create_static_body(Vec3::new(0.0, 1.0, -3.0), Quat::IDENTITY);
        physics.add_collider(
            trigger,
            ColliderShape::Sphere { radius: 1.0 },
            ColliderOptions::solid(volume, layers::DEFAULT).as_sensor(),
        );
        physics.update_queries();

        let hit = physics.raycast(&RayProbe {
            origin: Vec3::new(0.0, 1.0, 0.0),
            direction: Vec3::NEG_Z,
            max_distance: 10.0,
            layer_mask: layers::ALL,
            ignore: Some(observer),
        });

        assert!(hit.is_none());
    }

    #[test]
    fn test_overlap_filters_by_layer() {
        let (_world, player, enemy) = entity_pair();
        let mut physics = Physics::new();

        let player_body = physics.create_kinematic_body(Vec3::new(0.0, 0.0, -1.5), Quat::IDENTITY);
        physics.add_collider(
            player_body,
            ColliderShape::Capsule {
                half_height: 0.5,
                radius: 0.4,
            },
            ColliderOptions::solid(player, layers::PLAYER).with_offset(Vec3::Y),
        );
        let enemy_body = physics.create_kinematic_body(Vec3::ZERO, Quat::IDENTITY);
        physics.add_collider(
            enemy_body,
            ColliderShape::Capsule {
                half_height: 0.5,
                radius: 0.4,
            },
            ColliderOptions::solid(enemy, layers::ENEMY).with_offset(Vec3::Y),
        );
        physics.update_queries();

        let hits = physics.overlap_sphere(Vec3::new(0.0, 0.5, -1.0), 1.5, layers::PLAYER);
        assert_eq!(hits, vec![player]);
    }

    #[test]
    fn test_disabled_colliders_are_invisible() {
        let (_world, corpse, _) = entity_pair();
        let mut physics = Physics::new();
        let body = physics.create_static_body(Vec3::ZERO, Quat::IDENTITY);
        physics.add_collider(
            body,
            ColliderShape::Sphere { radius: 1.0 },
            ColliderOptions::solid(corpse, layers::ENEMY),
        );
        physics.update_queries();
        assert_eq!(physics.overlap_sphere(Vec3::ZERO, 0.5, layers::ALL).len(), 1);

        assert_eq!(physics.set_owner_collision(corpse, false), 1);
        physics.update_queries();
        assert!(physics.overlap_sphere(Vec3::ZERO, 0.5, layers::ALL).is_empty());
    }
}
