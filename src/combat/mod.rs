//! Damage capabilities shared by every damageable entity
//!
//! Attackers never touch health directly. They hand damage to a
//! [`DamageSink`], and the host routes it to the target: an agent's own damage
//! intake first, otherwise any [`Damageable`] such as plain [`Health`].

mod health;

use hecs::Entity;

pub use health::Health;

/// What a single damage application did to its receiver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Non-positive, non-finite, or the receiver was already dead
    Ignored,
    /// Receiver survived with this much health left
    Hurt { remaining: f32 },
    /// This application was the lethal one
    Killed,
}

impl DamageOutcome {
    /// True if the damage changed anything
    #[must_use]
    pub fn applied(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Something that can take damage
pub trait Damageable {
    /// Apply `amount` points of damage
    fn apply_damage(&mut self, amount: f32) -> DamageOutcome;

    /// Whether the receiver has died
    fn is_dead(&self) -> bool;
}

/// Damage delivery consumed by combat.
pub trait DamageSink {
    /// Deliver `amount` to `target` on behalf of `source`.
    ///
    /// Returns `false` when the target exposes no damage capability.
    fn apply_damage(&mut self, target: Entity, amount: f32, source: Entity) -> bool;
}

/// Damage request buffered until the receiver can be borrowed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingDamage {
    pub target: Entity,
    pub amount: f32,
    pub source: Entity,
}

/// A [`DamageSink`] that only records requests for later delivery
#[derive(Debug, Default)]
pub struct DamageBuffer {
    pending: Vec<PendingDamage>,
}

impl DamageBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered request, oldest first
    pub fn drain(&mut self) -> std::vec::Drain<'_, PendingDamage> {
        self.pending.drain(..)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl DamageSink for DamageBuffer {
    fn apply_damage(&mut self, target: Entity, amount: f32, source: Entity) -> bool {
        self.pending.push(PendingDamage {
            target,
            amount,
            source,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_keeps_order() {
        let mut world = hecs::World::new();
        let attacker = world.spawn(());
        let a = world.spawn(());
        let b = world.spawn(());

        let mut buffer = DamageBuffer::new();
        assert!(buffer.apply_damage(a, 20.0, attacker));
        assert!(buffer.apply_damage(b, 5.0, attacker));
        assert_eq!(buffer.len(), 2);

        let drained: Vec<_> = buffer.drain().collect();
        assert_eq!(drained[0].target, a);
        assert_eq!(drained[1].amount, 5.0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_outcome_applied() {
        assert!(!DamageOutcome::Ignored.applied());
        assert!(DamageOutcome::Killed.applied());
        assert!(DamageOutcome::Hurt { remaining: 1.0 }.applied());
    }
}
