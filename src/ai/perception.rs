//! Perception: distance, field of view and line of sight
//!
//! All checks are pure functions of the agent's pose, the target's position
//! and the world query facility, so they can be evaluated for any agent.

use glam::Vec3;
use hecs::Entity;

use super::config::AgentConfig;
use crate::ecs::Transform;
use crate::physics::{RayProbe, WorldQuery};

/// Finds candidate targets and resolves stored handles.
pub trait TargetDiscovery {
    /// First live entity carrying `tag`
    fn find_by_tag(&self, tag: &str) -> Option<Entity>;

    /// Position of `entity` if it still exists and is alive
    fn locate(&self, entity: Entity) -> Option<Vec3>;
}

/// Parent/child relationships between entities.
pub trait SceneGraph {
    /// True if `entity` is `ancestor` or sits below it
    fn is_self_or_descendant(&self, entity: Entity, ancestor: Entity) -> bool;
}

/// A target whose handle resolved this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetFix {
    pub entity: Entity,
    pub position: Vec3,
    /// Distance from the agent's base to the target's base
    pub distance: f32,
}

impl TargetFix {
    #[must_use]
    pub fn new(entity: Entity, position: Vec3, observer: Vec3) -> Self {
        Self {
            entity,
            position,
            distance: observer.distance(position),
        }
    }
}

/// Target is close enough to notice
#[must_use]
pub fn is_target_detected(config: &AgentConfig, target: Option<&TargetFix>) -> bool {
    target.is_some_and(|t| t.distance <= config.detection_radius)
}

/// Target is inside the view cone and not hidden behind anything.
///
/// The sight probe leaves from `eye_height` above the agent's base and runs
/// parallel to the base-to-base line, for the full target distance. The first solid hit blocks sight if it is on an obstacle
/// layer or belongs to neither the target nor one of its children.
#[must_use]
pub fn can_see_target(
    config: &AgentConfig,
    observer: Entity,
    transform: &Transform,
    target: Option<&TargetFix>,
    query: &dyn WorldQuery,
    scene: &dyn SceneGraph,
) -> bool {
    let Some(target) = target else {
        return false;
    };

    let to_target = target.position - transform.position;
    if to_target.length_squared() <= f32::EPSILON {
        return true;
    }

    let half_fov = (config.field_of_view * 0.5).to_radians();
    if transform.forward().angle_between(to_target) > half_fov + 1e-4 {
        return false;
    }

    // Eye to the same height on the target, so the probe runs parallel to
    // the base-to-base line and low props at the target's feet don't block it
    let eye_offset = Vec3::Y * config.eye_height;
    let eye = transform.position + eye_offset;
    let probe = RayProbe {
        origin: eye,
        direction: target.position + eye_offset - eye,
        max_distance: target.distance,
        layer_mask: crate::physics::layers::ALL,
        ignore: Some(observer),
    };

    match query.raycast(&probe) {
        None => true,
        Some(hit) => {
            if hit.layers & config.obstacle_layers != 0 {
                return false;
            }
            hit.entity
                .is_some_and(|entity| scene.is_self_or_descendant(entity, target.entity))
        }
    }
}

/// Target is still within reach of an ongoing chase.
///
/// Once engaged, the agent keeps tracking out to `lose_interest_radius`
/// rather than `detection_radius`, so a target hovering at the detection
/// boundary doesn't make the agent flap between Idle and Chasing.
#[must_use]
pub fn is_target_tracked(config: &AgentConfig, target: Option<&TargetFix>) -> bool {
    target.is_some_and(|t| t.distance <= config.lose_interest_radius)
}

/// Chase should be abandoned: target gone, out of tracking range, or hidden
#[must_use]
pub fn should_lose_interest(config: &AgentConfig, target: Option<&TargetFix>, visible: bool) -> bool {
    !is_target_tracked(config, target) || !visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::layers;
    use crate::test_support::{MockQuery, MockWorld};

    fn setup() -> (MockWorld, Entity, Entity) {
        let mut world = MockWorld::new();
        let agent = world.spawn_entity();
        let target = world.spawn_entity();
        (world, agent, target)
    }

    #[test]
    fn test_detection_radius_inclusive() {
        let (_, _, target) = setup();
        let config = AgentConfig::default();
        let at_edge = TargetFix::new(target, Vec3::new(0.0, 0.0, -15.0), Vec3::ZERO);
        let beyond = TargetFix::new(target, Vec3::new(0.0, 0.0, -15.1), Vec3::ZERO);

        assert!(is_target_detected(&config, Some(&at_edge)));
        assert!(!is_target_detected(&config, Some(&beyond)));
        assert!(!is_target_detected(&config, None));
    }

    #[test]
    fn test_field_of_view() {
        let (world, agent, target) = setup();
        let config = AgentConfig::default();
        let transform = Transform::new();
        let query = MockQuery::default();

        // 45 degrees off the nose: inside the 120 degree cone
        let ahead = TargetFix::new(target, Vec3::new(5.0, 0.0, -5.0), Vec3::ZERO);
        assert!(can_see_target(&config, agent, &transform, Some(&ahead), &query, &world));

        // Directly behind
        let behind = TargetFix::new(target, Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        assert!(!can_see_target(&config, agent, &transform, Some(&behind), &query, &world));
    }

    #[test]
    fn test_same_position_is_visible() {
        let (world, agent, target) = setup();
        let config = AgentConfig::default();
        let fix = TargetFix::new(target, Vec3::ZERO, Vec3::ZERO);
        assert!(can_see_target(
            &config,
            agent,
            &Transform::new(),
            Some(&fix),
            &MockQuery::default(),
            &world
        ));
    }

    #[test]
    fn test_obstacle_blocks_sight() {
        let (mut world, agent, target) = setup();
        let wall = world.spawn_entity();
        let config = AgentConfig::default();
        let fix = TargetFix::new(target, Vec3::new(0.0, 0.0, -10.0), Vec3::ZERO);
        let query = MockQuery::default().with_hit(Some(wall), layers::OBSTACLE, 5.0);

        assert!(!can_see_target(&config, agent, &Transform::new(), Some(&fix), &query, &world));
    }

    #[test]
    fn test_hit_on_target_child_counts_as_target() {
        let (mut world, agent, target) = setup();
        let sword = world.spawn_entity();
        let stranger = world.spawn_entity();
        world.set_parent(sword, target);
        let config = AgentConfig::default();
        let fix = TargetFix::new(target, Vec3::new(0.0, 0.0, -10.0), Vec3::ZERO);

        let query = MockQuery::default().with_hit(Some(sword), layers::PLAYER, 9.5);
        assert!(can_see_target(&config, agent, &Transform::new(), Some(&fix), &query, &world));

        let query = MockQuery::default().with_hit(Some(stranger), layers::DEFAULT, 4.0);
        assert!(!can_see_target(&config, agent, &Transform::new(), Some(&fix), &query, &world));
    }

    #[test]
    fn test_probe_leaves_from_eye_height() {
        let (world, agent, target) = setup();
        let config = AgentConfig::default();
        let fix = TargetFix::new(target, Vec3::new(0.0, 0.0, -6.0), Vec3::ZERO);
        let query = MockQuery::default();

        can_see_target(&config, agent, &Transform::new(), Some(&fix), &query, &world);

        let probes = query.probes();
        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0].origin, Vec3::Y);
        assert_eq!(probes[0].direction, Vec3::new(0.0, 0.0, -6.0));
        assert_eq!(probes[0].max_distance, 6.0);
        assert_eq!(probes[0].ignore, Some(agent));
    }

    #[test]
    fn test_lose_interest_hysteresis() {
        let (_, _, target) = setup();
        let config = AgentConfig::default();

        let at_18 = TargetFix::new(target, Vec3::new(0.0, 0.0, -18.0), Vec3::ZERO);
        let at_21 = TargetFix::new(target, Vec3::new(0.0, 0.0, -21.0), Vec3::ZERO);

        // 18 is outside detection but inside the lose-interest radius
        assert!(!is_target_detected(&config, Some(&at_18)));
        assert!(!should_lose_interest(&config, Some(&at_18), true));
        assert!(should_lose_interest(&config, Some(&at_21), true));
        assert!(should_lose_interest(&config, Some(&at_18), false));
        assert!(should_lose_interest(&config, None, true));
    }
}
