//! Enemy roster statistics

/// Spawn/kill counters for enemy agents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterStats {
    /// Agents spawned so far
    spawned: u32,
    /// Agents killed so far
    killed: u32,
}

impl RosterStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_spawn(&mut self) {
        self.spawned += 1;
    }

    pub fn record_kill(&mut self) {
        self.killed += 1;
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn killed(&self) -> u32 {
        self.killed
    }

    /// Agents still alive
    pub fn remaining(&self) -> u32 {
        self.spawned.saturating_sub(self.killed)
    }

    /// Get a formatted stats string
    pub fn format_stats(&self) -> String {
        format!(
            "Enemies: {} spawned | {} killed | {} remaining",
            self.spawned,
            self.killed,
            self.remaining()
        )
    }
}
