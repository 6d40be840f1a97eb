//! Agent tuning parameters
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Values are normalized once when an agent is built.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::physics::layers;

/// Smallest allowed minimum idle-variety delay, in seconds
pub const MIN_IDLE_DELAY: f32 = 0.1;

/// Tuning for one melee agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    // Targeting
    /// Tag searched for when the agent has no target
    pub target_tag: String,
    /// Seconds between target searches
    pub target_search_interval: f32,
    /// Distance within which the target is noticed
    pub detection_radius: f32,
    /// Distance beyond which a chase is abandoned
    pub lose_interest_radius: f32,
    /// Full view cone angle, in degrees
    pub field_of_view: f32,
    /// Height of the sight probe above the agent's base
    pub eye_height: f32,
    /// Layers that block line of sight
    pub obstacle_layers: u32,

    // Movement
    /// Planner stops this close to the destination
    pub stopping_distance: f32,
    /// Minimum seconds between destination updates
    pub path_update_interval: f32,
    /// Facing smoothing rate
    pub rotation_speed: f32,
    /// Top speed of the reference planner
    pub move_speed: f32,

    // Attack
    pub attack_range: f32,
    /// Extra distance past `attack_range` before an attack is abandoned
    pub attack_exit_buffer: f32,
    pub time_between_attacks: f32,
    pub damage_per_hit: f32,
    /// Radius of the hit sphere
    pub attack_radius: f32,
    /// Number of attack animations to choose from
    pub attack_variants: u32,
    /// Hit sphere center in agent-local space, if not the default in front of the chest
    pub attack_point: Option<Vec3>,
    /// Layers the hit sphere can damage
    pub target_layers: u32,

    // Health
    pub max_health: f32,
    /// Seconds between death and removal
    pub death_destroy_delay: f32,

    // Idle
    pub idle_special_min_delay: f32,
    pub idle_special_max_delay: f32,
    /// Number of idle variants (0 is the plain idle)
    pub idle_variants: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            target_tag: "Player".to_string(),
            target_search_interval: 2.0,
            detection_radius: 15.0,
            lose_interest_radius: 20.0,
            field_of_view: 120.0,
            eye_height: 1.0,
            obstacle_layers: layers::OBSTACLE,

            stopping_distance: 2.0,
            path_update_interval: 0.1,
            rotation_speed: 10.0,
            move_speed: 3.5,

            attack_range: 2.0,
            attack_exit_buffer: 0.5,
            time_between_attacks: 1.5,
            damage_per_hit: 20.0,
            attack_radius: 1.5,
            attack_variants: 2,
            attack_point: None,
            target_layers: layers::PLAYER,

            max_health: 100.0,
            death_destroy_delay: 5.0,

            idle_special_min_delay: 3.0,
            idle_special_max_delay: 10.0,
            idle_variants: 3,
        }
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

impl AgentConfig {
    /// Clamp every field into its valid range.
    ///
    /// Lose-interest never sits inside detection, counts are at least one,
    /// and the idle window is `[>= 0.1, >= min]`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.target_search_interval = non_negative(self.target_search_interval);
        self.detection_radius = non_negative(self.detection_radius);
        self.lose_interest_radius = non_negative(self.lose_interest_radius).max(self.detection_radius);
        self.field_of_view = if self.field_of_view.is_finite() {
            self.field_of_view.clamp(0.0, 360.0)
        } else {
            360.0
        };
        self.eye_height = non_negative(self.eye_height);

        self.stopping_distance = non_negative(self.stopping_distance);
        self.path_update_interval = non_negative(self.path_update_interval);
        self.rotation_speed = non_negative(self.rotation_speed);
        self.move_speed = non_negative(self.move_speed);

        self.attack_range = non_negative(self.attack_range);
        self.attack_exit_buffer = non_negative(self.attack_exit_buffer);
        self.time_between_attacks = non_negative(self.time_between_attacks);
        self.damage_per_hit = non_negative(self.damage_per_hit);
        self.attack_radius = non_negative(self.attack_radius);
        self.attack_variants = self.attack_variants.max(1);

        if !(self.max_health.is_finite() && self.max_health > 0.0) {
            self.max_health = 100.0;
        }
        self.death_destroy_delay = non_negative(self.death_destroy_delay);

        self.idle_special_min_delay = non_negative(self.idle_special_min_delay).max(MIN_IDLE_DELAY);
        self.idle_special_max_delay =
            non_negative(self.idle_special_max_delay).max(self.idle_special_min_delay);
        self.idle_variants = self.idle_variants.max(1);

        self
    }

    /// Distance at which an attack is abandoned for a chase
    #[must_use]
    pub fn attack_exit_range(&self) -> f32 {
        self.attack_range + self.attack_exit_buffer
    }

    /// Parse a RON document
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Serialize to pretty RON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Load a config from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&content)
    }

    /// Load a config from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Errors from loading or saving an [`AgentConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid RON config: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_tuning() {
        let config = AgentConfig::default();
        assert_eq!(config.detection_radius, 15.0);
        assert_eq!(config.lose_interest_radius, 20.0);
        assert_eq!(config.field_of_view, 120.0);
        assert_eq!(config.attack_exit_range(), 2.5);
        assert_eq!(config.time_between_attacks, 1.5);
        assert_eq!(config.idle_variants, 3);
        assert_eq!(config.clone().normalized(), config);
    }

    #[test]
    fn test_normalization_clamps() {
        let config = AgentConfig {
            detection_radius: -4.0,
            lose_interest_radius: 10.0,
            field_of_view: 500.0,
            attack_variants: 0,
            idle_variants: 0,
            idle_special_min_delay: 0.0,
            idle_special_max_delay: -2.0,
            max_health: 0.0,
            ..Default::default()
        }
        .normalized();

        assert_eq!(config.detection_radius, 0.0);
        assert_eq!(config.lose_interest_radius, 10.0);
        assert_eq!(config.field_of_view, 360.0);
        assert_eq!(config.attack_variants, 1);
        assert_eq!(config.idle_variants, 1);
        assert_eq!(config.idle_special_min_delay, MIN_IDLE_DELAY);
        assert_eq!(config.idle_special_max_delay, MIN_IDLE_DELAY);
        assert_eq!(config.max_health, 100.0);
    }

    #[test]
    fn test_lose_interest_never_inside_detection() {
        let config = AgentConfig {
            detection_radius: 25.0,
            lose_interest_radius: 20.0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.lose_interest_radius, 25.0);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = AgentConfig {
            target_tag: "Hero".to_string(),
            attack_point: Some(Vec3::new(0.0, 1.0, -1.2)),
            ..Default::default()
        };
        let text = config.to_ron_string().unwrap();
        let loaded = AgentConfig::from_ron_str(&text).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let loaded = AgentConfig::from_ron_str("(detection_radius: 8.0)").unwrap();
        assert_eq!(loaded.detection_radius, 8.0);
        assert_eq!(loaded.attack_range, 2.0);
    }

    #[test]
    fn test_load_from_files() {
        let dir = std::env::temp_dir();
        let ron_path = dir.join(format!("melee_ai_config_{}.ron", std::process::id()));
        let json_path = dir.join(format!("melee_ai_config_{}.json", std::process::id()));

        let config = AgentConfig {
            detection_radius: 12.0,
            ..Default::default()
        };
        fs::write(&ron_path, config.to_ron_string().unwrap()).unwrap();
        fs::write(&json_path, serde_json::to_string(&config).unwrap()).unwrap();

        assert_eq!(AgentConfig::load_ron(&ron_path).unwrap(), config);
        assert_eq!(AgentConfig::load_json(&json_path).unwrap(), config);

        fs::remove_file(&ron_path).unwrap();
        fs::remove_file(&json_path).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            AgentConfig::load_ron("/nonexistent/agent.ron"),
            Err(ConfigError::Io { .. })
        ));
        assert!(matches!(
            AgentConfig::load_json("/nonexistent/agent.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_bad_ron_is_an_error() {
        assert!(matches!(
            AgentConfig::from_ron_str("(detection_radius: \"far\")"),
            Err(ConfigError::Ron(_))
        ));
    }
}
