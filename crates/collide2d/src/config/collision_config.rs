//! Collision registry configuration

use super::{Config, ConfigError};
use crate::physics::collision_layers::CollisionMatrix;
use serde::{Deserialize, Serialize};

/// Settings for a [`CollisionRegistry`](crate::physics::CollisionRegistry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Run per-step work; a disabled registry keeps its state untouched
    pub enabled: bool,

    /// Fire EXIT on the surviving owner when a touching pair loses a participant
    pub exit_on_removal: bool,

    /// Trace every ENTER/STAY/EXIT transition through the `log` facade
    pub log_transitions: bool,

    /// Group-vs-group filter
    pub matrix: CollisionMatrix,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exit_on_removal: false,
            log_transitions: false,
            matrix: CollisionMatrix::default(),
        }
    }
}

impl Config for CollisionConfig {}

impl CollisionConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a RON document
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants not expressible in the serialized form
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.matrix.validate()
    }
}
