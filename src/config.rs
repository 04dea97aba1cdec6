//! Configuration for the Catpoint security controller.

use crate::data::{Sensor, SensorType};
use crate::image::DEFAULT_CONFIDENCE_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Main configuration for the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Confidence (0-100) a camera frame needs to count as a cat
    pub cat_confidence_threshold: f32,

    /// Default `tracing` filter, overridden by `RUST_LOG`
    pub log_filter: String,

    /// Sensors registered at startup
    pub sensors: Vec<SensorConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cat_confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            log_filter: "info".to_string(),
            sensors: vec![
                SensorConfig::new("Front Door", SensorType::Door),
                SensorConfig::new("Living Room Window", SensorType::Window),
                SensorConfig::new("Hallway", SensorType::Motion),
            ],
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("catpoint")
            .join("config.json")
    }

    /// Reject values the service cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.cat_confidence_threshold) {
            return Err(ConfigError::InvalidValue(format!(
                "cat_confidence_threshold must be within 0-100, got {}",
                self.cat_confidence_threshold
            )));
        }

        let mut seen = HashSet::new();
        for sensor in &self.sensors {
            if !seen.insert(sensor.name.to_lowercase()) {
                return Err(ConfigError::InvalidValue(format!(
                    "duplicate sensor name '{}'",
                    sensor.name
                )));
            }
        }

        Ok(())
    }
}

/// A sensor to register at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub name: String,
    pub sensor_type: SensorType,
}

impl SensorConfig {
    pub fn new(name: impl Into<String>, sensor_type: SensorType) -> Self {
        Self {
            name: name.into(),
            sensor_type,
        }
    }

    /// Build a fresh, inactive sensor from this entry.
    pub fn to_sensor(&self) -> Sensor {
        Sensor::new(self.name.clone(), self.sensor_type)
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidValue(e) => write!(f, "Invalid value: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
