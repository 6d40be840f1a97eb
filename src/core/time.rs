//! Simulation time tracking

/// Fixed-step simulation clock
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Time {
    /// Seconds since the simulation started
    elapsed: f32,
    /// Length of the last step
    delta: f32,
    /// Number of steps taken
    tick: u64,
}

impl Time {
    /// Create a clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `dt` seconds (negative steps are treated as zero)
    pub fn advance(&mut self, dt: f32) {
        self.delta = dt.max(0.0);
        self.elapsed += self.delta;
        self.tick += 1;
    }

    /// Seconds since the simulation started
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Length of the last step in seconds
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Number of steps taken
    pub fn tick(&self) -> u64 {
        self.tick
    }
}
