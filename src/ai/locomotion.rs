//! Locomotion bridge between the agent and its path planner
//!
//! The agent never moves itself. It hands destinations to a [`PathPlanner`]
//! (throttled) and only turns its own body to face a target.

use glam::{Quat, Vec3};

use crate::ecs::Transform;

/// Horizontal directions shorter than this are treated as "no direction"
const MIN_FACING_DISTANCE: f32 = 1e-3;

/// External navigation service
pub trait PathPlanner {
    /// Head for `destination`
    fn set_destination(&mut self, destination: Vec3);
    /// Halt in place, keeping the current path
    fn stop(&mut self);
    /// Continue along the current path
    fn resume(&mut self);
    /// Forget the current path
    fn reset_path(&mut self);
    /// Velocity the planner is currently commanding
    fn current_velocity(&self) -> Vec3;
    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    fn is_stopped(&self) -> bool;
}

/// Throttles destination updates sent to the planner.
#[derive(Debug, Clone)]
pub struct LocomotionBridge {
    path_update_interval: f32,
    next_path_update_time: f32,
}

impl LocomotionBridge {
    #[must_use]
    pub fn new(path_update_interval: f32) -> Self {
        Self {
            path_update_interval: path_update_interval.max(0.0),
            next_path_update_time: 0.0,
        }
    }

    /// Send `destination` if the throttle allows it. Returns whether it was sent.
    pub fn request_destination(
        &mut self,
        planner: &mut dyn PathPlanner,
        destination: Vec3,
        now: f32,
    ) -> bool {
        if now < self.next_path_update_time || !planner.is_enabled() {
            return false;
        }
        planner.set_destination(destination);
        self.next_path_update_time = now + self.path_update_interval;
        true
    }

    /// Stop, drop the path, and zero the commanded velocity
    pub fn halt(planner: &mut dyn PathPlanner) {
        if planner.is_enabled() {
            planner.stop();
            planner.reset_path();
        }
    }

    /// Stop without dropping the path
    pub fn stop(planner: &mut dyn PathPlanner) {
        if planner.is_enabled() {
            planner.stop();
        }
    }

    pub fn resume(planner: &mut dyn PathPlanner) {
        if planner.is_enabled() {
            planner.resume();
        }
    }

    /// Current planar speed (zero when the planner is absent or disabled)
    #[must_use]
    pub fn speed(planner: Option<&dyn PathPlanner>) -> f32 {
        match planner {
            Some(p) if p.is_enabled() => {
                let v = p.current_velocity();
                Vec3::new(v.x, 0.0, v.z).length()
            }
            _ => 0.0,
        }
    }
}

/// Yaw that points the local -Z axis along `direction`
fn yaw_towards(direction: Vec3) -> f32 {
    (-direction.x).atan2(-direction.z)
}

/// Turn `transform` toward `target` about the vertical axis.
///
/// Uses exponential smoothing with `t = 1 - exp(-rate * dt)`, so the result
/// is frame-rate independent. Targets directly above or below are ignored.
pub fn face_towards(transform: &mut Transform, target: Vec3, rate: f32, dt: f32) {
    let offset = target - transform.position;
    let horizontal = Vec3::new(offset.x, 0.0, offset.z);
    if horizontal.length() < MIN_FACING_DISTANCE {
        return;
    }

    let desired = Quat::from_rotation_y(yaw_towards(horizontal));
    let t = 1.0 - (-rate.max(0.0) * dt.max(0.0)).exp();
    transform.rotation = transform.rotation.slerp(desired, t).normalize();
}
