//! Steering behaviors for AI movement
//!
//! Provides the arrive behavior and a steering-driven reference
//! implementation of the [`PathPlanner`] interface.

use glam::Vec3;

use super::locomotion::PathPlanner;

/// Output from a steering behavior
#[derive(Debug, Clone, Copy, Default)]
pub struct SteeringOutput {
    /// Linear acceleration
    pub linear: Vec3,
    /// Angular acceleration (yaw)
    pub angular: f32,
}

impl SteeringOutput {
    /// Zero steering
    pub const ZERO: Self = Self {
        linear: Vec3::ZERO,
        angular: 0.0,
    };
}

/// Trait for steering behaviors
pub trait SteeringBehavior {
    /// Calculate steering based on agent state
    fn calculate(&self, position: Vec3, velocity: Vec3) -> SteeringOutput;
}

/// Arrive behavior - move towards target and slow down
#[derive(Debug, Clone)]
pub struct Arrive {
    /// Target position
    pub target: Vec3,
    /// Maximum acceleration
    pub max_acceleration: f32,
    /// Maximum speed
    pub max_speed: f32,
    /// Slowing distance
    pub slow_radius: f32,
    /// Stopping distance
    pub target_radius: f32,
}

impl Arrive {
    /// Create a new arrive behavior
    #[must_use]
    pub fn new(target: Vec3, max_acceleration: f32, max_speed: f32) -> Self {
        Self {
            target,
            max_acceleration,
            max_speed,
            slow_radius: 5.0,
            target_radius: 0.5,
        }
    }
}

impl SteeringBehavior for Arrive {
    fn calculate(&self, position: Vec3, velocity: Vec3) -> SteeringOutput {
        let to_target = self.target - position;
        let distance = to_target.length();

        if distance < self.target_radius {
            return SteeringOutput::ZERO;
        }

        let target_speed = if distance > self.slow_radius {
            self.max_speed
        } else {
            self.max_speed * distance / self.slow_radius
        };

        let target_velocity = to_target.normalize_or_zero() * target_speed;
        let acceleration = target_velocity - velocity;

        let accel_magnitude = acceleration.length();
        if accel_magnitude > self.max_acceleration {
            return SteeringOutput {
                linear: acceleration.normalize_or_zero() * self.max_acceleration,
                angular: 0.0,
            };
        }

        SteeringOutput {
            linear: acceleration,
            angular: 0.0,
        }
    }
}

/// Reference [`PathPlanner`]: arrive steering on the horizontal plane.
///
/// Stands in for a navigation mesh agent. There is no obstacle avoidance;
/// the planner slides straight toward its destination and settles once
/// within `stopping_distance`.
#[derive(Debug, Clone)]
pub struct SteeringPlanner {
    /// Current destination, if any
    destination: Option<Vec3>,
    /// Commanded velocity
    velocity: Vec3,
    /// Maximum speed
    pub max_speed: f32,
    /// Maximum acceleration
    pub max_acceleration: f32,
    /// Settles this close to the destination
    pub stopping_distance: f32,
    /// Begins slowing this far from the stopping point
    pub slow_radius: f32,
    enabled: bool,
    stopped: bool,
}

impl SteeringPlanner {
    /// Create a planner with the given top speed and stopping distance
    #[must_use]
    pub fn new(max_speed: f32, stopping_distance: f32) -> Self {
        Self {
            destination: None,
            velocity: Vec3::ZERO,
            max_speed,
            max_acceleration: max_speed * 4.0,
            stopping_distance,
            slow_radius: stopping_distance + 3.0,
            enabled: true,
            stopped: false,
        }
    }

    /// Current destination
    #[must_use]
    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    /// Integrate one step and move `position`.
    pub fn advance(&mut self, position: &mut Vec3, dt: f32) {
        let Some(destination) = self.destination else {
            self.velocity = Vec3::ZERO;
            return;
        };
        if !self.enabled || self.stopped || dt <= 0.0 {
            self.velocity = Vec3::ZERO;
            return;
        }

        // Planar pursuit: the destination is flattened to our height
        let goal = Vec3::new(destination.x, position.y, destination.z);
        if position.distance(goal) <= self.stopping_distance {
            self.velocity = Vec3::ZERO;
            return;
        }

        let arrive = Arrive {
            target: goal,
            max_acceleration: self.max_acceleration,
            max_speed: self.max_speed,
            slow_radius: self.slow_radius,
            target_radius: self.stopping_distance,
        };
        let steering = arrive.calculate(*position, self.velocity);

        let mut velocity = self.velocity + steering.linear * dt;
        velocity.y = 0.0;
        self.velocity = velocity.clamp_length_max(self.max_speed);
        *position += self.velocity * dt;
    }
}

impl PathPlanner for SteeringPlanner {
    fn set_destination(&mut self, destination: Vec3) {
        self.destination = Some(destination);
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.velocity = Vec3::ZERO;
    }

    fn resume(&mut self) {
        self.stopped = false;
    }

    fn reset_path(&mut self) {
        self.destination = None;
        self.velocity = Vec3::ZERO;
    }

    fn current_velocity(&self) -> Vec3 {
        if self.enabled { self.velocity } else { Vec3::ZERO }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.velocity = Vec3::ZERO;
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrive_slowing() {
        let arrive = Arrive::new(Vec3::new(1.0, 0.0, 0.0), 5.0, 10.0);
        let output = arrive.calculate(Vec3::ZERO, Vec3::ZERO);

        // Should have some acceleration towards target
        assert!(output.linear.x > 0.0);
    }

    #[test]
    fn test_planner_settles_at_stopping_distance() {
        let mut planner = SteeringPlanner::new(3.5, 2.0);
        let mut position = Vec3::ZERO;
        planner.set_destination(Vec3::new(10.0, 0.0, 0.0));

        for _ in 0..900 {
            planner.advance(&mut position, 1.0 / 60.0);
        }

        let remaining = position.distance(Vec3::new(10.0, 0.0, 0.0));
        assert!(remaining <= 2.1, "stopped {remaining} away");
        assert!(remaining >= 1.9);
        assert_eq!(planner.current_velocity(), Vec3::ZERO);
    }

    #[test]
    fn test_planner_stays_on_plane() {
        let mut planner = SteeringPlanner::new(3.5, 0.5);
        let mut position = Vec3::ZERO;
        planner.set_destination(Vec3::new(0.0, 4.0, -10.0));
        planner.advance(&mut position, 0.1);

        assert_eq!(position.y, 0.0);
        assert!(position.z < 0.0);
        assert_eq!(planner.current_velocity().y, 0.0);
    }

    #[test]
    fn test_stopped_or_disabled_planner_holds_position() {
        let mut planner = SteeringPlanner::new(3.5, 0.5);
        let mut position = Vec3::ZERO;
        planner.set_destination(Vec3::new(10.0, 0.0, 0.0));

        planner.stop();
        planner.advance(&mut position, 0.1);
        assert_eq!(position, Vec3::ZERO);
        assert!(planner.is_stopped());

        planner.resume();
        planner.set_enabled(false);
        planner.advance(&mut position, 0.1);
        assert_eq!(position, Vec3::ZERO);

        planner.set_enabled(true);
        planner.advance(&mut position, 0.1);
        assert!(position.x > 0.0);

        planner.reset_path();
        assert_eq!(planner.destination(), None);
        assert_eq!(planner.current_velocity(), Vec3::ZERO);
    }
}
