//! Generic health pool for damageable entities

use serde::{Deserialize, Serialize};

use super::{DamageOutcome, Damageable};

const FALLBACK_MAX_HEALTH: f32 = 100.0;

/// Health component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    current: f32,
    max: f32,
    /// Host removes the entity once it dies
    #[serde(default)]
    pub destroy_on_death: bool,
}

impl Health {
    /// Full health pool; a non-positive or non-finite max falls back to 100
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = if max.is_finite() && max > 0.0 {
            max
        } else {
            FALLBACK_MAX_HEALTH
        };
        Self {
            current: max,
            max,
            destroy_on_death: false,
        }
    }

    /// Pool starting at `current`.
    ///
    /// A non-positive max falls back to `current` (or 100), and `current` is
    /// clamped into `[0, max]`.
    #[must_use]
    pub fn with_current(max: f32, current: f32) -> Self {
        let current = if current.is_finite() { current } else { 0.0 };
        let max = if max.is_finite() && max > 0.0 {
            max
        } else if current > 0.0 {
            current
        } else {
            FALLBACK_MAX_HEALTH
        };
        Self {
            current: current.clamp(0.0, max),
            max,
            destroy_on_death: false,
        }
    }

    /// Mark this pool so the host removes its holder on death
    #[must_use]
    pub fn destroy_on_death(mut self) -> Self {
        self.destroy_on_death = true;
        self
    }

    #[must_use]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Restore up to `amount`, clamping at max. Returns the amount restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !amount.is_finite() || amount <= 0.0 || self.is_dead() {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(FALLBACK_MAX_HEALTH)
    }
}

impl Damageable for Health {
    /// Subtract `amount`, clamping at zero.
    fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        if !amount.is_finite() || amount <= 0.0 || self.is_dead() {
            return DamageOutcome::Ignored;
        }

        self.current = (self.current - amount).max(0.0);
        if self.is_dead() {
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hurt {
                remaining: self.current,
            }
        }
    }

    fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut health = Health::new(50.0);
        assert_eq!(health.apply_damage(20.0), DamageOutcome::Hurt { remaining: 30.0 });
        assert_eq!(health.apply_damage(100.0), DamageOutcome::Killed);
        assert_eq!(health.current(), 0.0);
    }

    #[test]
    fn test_death_reported_once() {
        let mut health = Health::new(10.0);
        assert_eq!(health.apply_damage(10.0), DamageOutcome::Killed);
        assert_eq!(health.apply_damage(10.0), DamageOutcome::Ignored);
        assert!(health.is_dead());
    }

    #[test]
    fn test_invalid_damage_ignored() {
        let mut health = Health::new(10.0);
        assert_eq!(health.apply_damage(0.0), DamageOutcome::Ignored);
        assert_eq!(health.apply_damage(-5.0), DamageOutcome::Ignored);
        assert_eq!(health.apply_damage(f32::NAN), DamageOutcome::Ignored);
        assert_eq!(health.current(), 10.0);
    }

    #[test]
    fn test_heal_clamps_and_skips_dead() {
        let mut health = Health::with_current(100.0, 60.0);
        assert_eq!(health.heal(25.0), 25.0);
        assert_eq!(health.heal(50.0), 15.0);
        assert_eq!(health.current(), 100.0);
        assert_eq!(health.heal(-1.0), 0.0);

        health.apply_damage(200.0);
        assert_eq!(health.heal(10.0), 0.0);
        assert!(health.is_dead());
    }

    #[test]
    fn test_damage_through_capability() {
        let mut health = Health::new(40.0);
        let receiver: &mut dyn Damageable = &mut health;
        assert_eq!(receiver.apply_damage(15.0), DamageOutcome::Hurt { remaining: 25.0 });
        assert!(!receiver.is_dead());
        assert_eq!(receiver.apply_damage(25.0), DamageOutcome::Killed);
        assert!(receiver.is_dead());
    }

    #[test]
    fn test_construction_normalizes() {
        assert_eq!(Health::new(-3.0).max(), 100.0);
        assert_eq!(Health::with_current(0.0, 40.0).max(), 40.0);
        assert_eq!(Health::with_current(50.0, 80.0).current(), 50.0);
        assert_eq!(Health::with_current(50.0, -1.0).current(), 0.0);
    }
}
