//! Scenario files
//!
//! A scenario lists the agents, targets and obstacles a [`Simulation`] starts
//! with. Scenarios are saved and loaded as RON (Rusty Object Notation) or JSON.
//!
//! [`Simulation`]: super::Simulation

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::AgentConfig;

fn default_target_tag() -> String {
    "Player".to_string()
}

fn default_max_health() -> f32 {
    100.0
}

fn default_walk_speed() -> f32 {
    2.0
}

/// An enemy agent to spawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpawn {
    /// Optional entity name
    #[serde(default)]
    pub name: Option<String>,
    pub position: Vec3,
    /// Facing, in radians around +Y (0 faces -Z)
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub config: AgentConfig,
}

/// A damageable target (usually the player)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSpawn {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_target_tag")]
    pub tag: String,
    pub position: Vec3,
    #[serde(default = "default_max_health")]
    pub max_health: f32,
    /// Remove the target from the world when it dies
    #[serde(default)]
    pub destroy_on_death: bool,
    /// Waypoints the target walks through, in order
    #[serde(default)]
    pub path: Vec<Vec3>,
    /// Walking speed along `path`
    #[serde(default = "default_walk_speed")]
    pub speed: f32,
}

/// A static box that blocks line of sight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpawn {
    #[serde(default)]
    pub name: Option<String>,
    /// Box center
    pub position: Vec3,
    pub half_extents: Vec3,
    #[serde(default)]
    pub yaw: f32,
}

/// A serializable starting layout for a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Scenario version for compatibility
    pub version: u32,
    /// Seed for the simulation RNG
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub agents: Vec<AgentSpawn>,
    #[serde(default)]
    pub targets: Vec<TargetSpawn>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleSpawn>,
}

impl Scenario {
    /// Create a new empty scenario
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            seed: 0,
            agents: Vec::new(),
            targets: Vec::new(),
            obstacles: Vec::new(),
        }
    }

    /// Built-in demo: a player walks up to an enemy, past a wall
    #[must_use]
    pub fn arena() -> Self {
        let mut scenario = Self::new("Arena");
        scenario.seed = 42;
        scenario.agents.push(AgentSpawn {
            name: Some("Mech Mutant".to_string()),
            position: Vec3::ZERO,
            yaw: 0.0,
            config: AgentConfig::default(),
        });
        scenario.targets.push(TargetSpawn {
            name: Some("Player".to_string()),
            tag: default_target_tag(),
            position: Vec3::new(-12.0, 0.0, -12.0),
            max_health: 100.0,
            destroy_on_death: false,
            path: vec![Vec3::new(0.0, 0.0, -12.0), Vec3::new(0.0, 0.0, -4.0)],
            speed: 2.0,
        });
        scenario.obstacles.push(ObstacleSpawn {
            name: Some("Wall".to_string()),
            position: Vec3::new(-8.0, 1.5, -8.0),
            half_extents: Vec3::new(3.0, 1.5, 0.25),
            yaw: 0.0,
        });
        scenario
    }

    /// Parse a RON document
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid scenario
    pub fn from_ron_str(text: &str) -> Result<Self, ScenarioError> {
        Ok(ron::from_str(text)?)
    }

    /// Save the scenario to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        write_file(path.as_ref(), ron_string)
    }

    /// Load a scenario from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        Self::from_ron_str(&read_file(path.as_ref())?)
    }

    /// Save the scenario to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let json_string = serde_json::to_string_pretty(self)?;
        write_file(path.as_ref(), json_string)
    }

    /// Load a scenario from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(&read_file(path.as_ref())?)?)
    }

    /// Load by file extension (`.json`, otherwise RON)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::load_json(path),
            _ => Self::load_ron(path),
        }
    }

    /// Total number of entities the scenario spawns
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.agents.len() + self.targets.len() + self.obstacles.len()
    }

    /// Check if the scenario is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entity_count() == 0
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

fn read_file(path: &Path) -> Result<String, ScenarioError> {
    fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: String) -> Result<(), ScenarioError> {
    fs::write(path, contents).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors that can occur during scenario operations
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] ron::error::SpannedError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_serialization_ron() {
        let scenario = Scenario::arena();

        let ron_str =
            ron::ser::to_string_pretty(&scenario, ron::ser::PrettyConfig::default()).unwrap();
        assert!(ron_str.contains("Mech Mutant"));

        let loaded = Scenario::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, scenario);
        assert_eq!(loaded.entity_count(), 3);
    }

    #[test]
    fn test_scenario_serialization_json() {
        let scenario = Scenario::arena();
        let json_str = serde_json::to_string_pretty(&scenario).unwrap();
        let loaded: Scenario = serde_json::from_str(&json_str).unwrap();
        assert_eq!(loaded.targets[0].path.len(), 2);
        assert_eq!(loaded.agents[0].config, AgentConfig::default());
    }

    #[test]
    fn test_minimal_ron_fills_defaults() {
        let text = r#"(
            name: "Tiny",
            version: 1,
            agents: [(position: (0.0, 0.0, 0.0))],
            targets: [(position: (0.0, 0.0, -5.0))],
        )"#;
        let scenario = Scenario::from_ron_str(text).unwrap();
        assert_eq!(scenario.targets[0].tag, "Player");
        assert_eq!(scenario.targets[0].max_health, 100.0);
        assert_eq!(scenario.agents[0].config.detection_radius, 15.0);
        assert!(scenario.obstacles.is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = Scenario::load("/nonexistent/arena.ron");
        assert!(matches!(result, Err(ScenarioError::Io { .. })));
    }

    #[test]
    fn test_empty_scenario() {
        let scenario = Scenario::default();
        assert!(scenario.is_empty());
        assert_eq!(scenario.name, "Untitled");
    }
}
