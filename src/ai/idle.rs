//! Idle variety: occasional cosmetic fidgets while standing around

use rand::{Rng, RngCore};

/// Picks idle variants on a randomized cadence, never the same one twice in a row.
#[derive(Debug, Clone)]
pub struct IdleVarietyScheduler {
    min_delay: f32,
    max_delay: f32,
    variants: u32,
    next_time: f32,
    last_variant: Option<u32>,
}

impl IdleVarietyScheduler {
    /// Delays are expected to be normalized already (`0.1 <= min <= max`)
    #[must_use]
    pub fn new(min_delay: f32, max_delay: f32, variants: u32) -> Self {
        let min_delay = min_delay.max(super::config::MIN_IDLE_DELAY);
        Self {
            min_delay,
            max_delay: max_delay.max(min_delay),
            variants: variants.max(1),
            next_time: f32::INFINITY,
            last_variant: None,
        }
    }

    /// Push the next deadline to `now` plus a random delay
    pub fn reschedule(&mut self, now: f32, rng: &mut dyn RngCore) {
        let delay = if self.max_delay > self.min_delay {
            rng.gen_range(self.min_delay..=self.max_delay)
        } else {
            self.min_delay
        };
        self.next_time = now + delay;
    }

    /// Random variant that differs from the previous pick when possible
    pub fn pick_variant(&mut self, rng: &mut dyn RngCore) -> u32 {
        let variant = match self.last_variant {
            Some(last) if self.variants > 1 => {
                // Draw from the other variants and skip over the last one
                let v = rng.gen_range(0..self.variants - 1);
                if v >= last { v + 1 } else { v }
            }
            _ => rng.gen_range(0..self.variants),
        };
        self.last_variant = Some(variant);
        variant
    }

    /// Advance the scheduler. Returns the variant to play when one is due.
    ///
    /// A due pick while the agent is still moving is skipped and rescheduled.
    pub fn tick(&mut self, now: f32, moving: bool, rng: &mut dyn RngCore) -> Option<u32> {
        if now < self.next_time {
            return None;
        }
        if moving {
            self.reschedule(now, rng);
            return None;
        }
        let variant = self.pick_variant(rng);
        self.reschedule(now, rng);
        Some(variant)
    }

    #[must_use]
    pub fn next_time(&self) -> f32 {
        self.next_time
    }

    #[must_use]
    pub fn last_variant(&self) -> Option<u32> {
        self.last_variant
    }
}
