//! Configuration file support for Oshfit.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/oshfit/config.toml`.

use crate::catalog::Exercise;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub achievements: AchievementConfig,

    #[serde(default)]
    pub exercises: ExerciseConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Tunable achievement thresholds
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AchievementConfig {
    /// Sessions starting before this hour count as early
    #[serde(default = "default_early_bird_hour")]
    pub early_bird_hour: u32,

    /// Sessions starting at or after this hour count as late
    #[serde(default = "default_night_owl_hour")]
    pub night_owl_hour: u32,

    #[serde(default = "default_weight_increase_percent")]
    pub weight_increase_percent: f64,

    #[serde(default = "default_heavy_lift_kg")]
    pub heavy_lift_kg: f64,

    #[serde(default = "default_volume_target_kg")]
    pub volume_target_kg: f64,
}

impl Default for AchievementConfig {
    fn default() -> Self {
        Self {
            early_bird_hour: default_early_bird_hour(),
            night_owl_hour: default_night_owl_hour(),
            weight_increase_percent: default_weight_increase_percent(),
            heavy_lift_kg: default_heavy_lift_kg(),
            volume_target_kg: default_volume_target_kg(),
        }
    }
}

/// Exercises added on top of the default catalog
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ExerciseConfig {
    #[serde(default)]
    pub custom: Vec<Exercise>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("oshfit")
}

fn default_early_bird_hour() -> u32 {
    8
}

fn default_night_owl_hour() -> u32 {
    21
}

fn default_weight_increase_percent() -> f64 {
    5.0
}

fn default_heavy_lift_kg() -> f64 {
    100.0
}

fn default_volume_target_kg() -> f64 {
    10_000.0
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("oshfit").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject thresholds no session could ever meet
    pub fn validate(&self) -> Result<()> {
        let a = &self.achievements;
        if a.early_bird_hour == 0 || a.early_bird_hour > 24 {
            return Err(Error::Config(format!(
                "early_bird_hour must be within 1..=24, got {}",
                a.early_bird_hour
            )));
        }
        if a.night_owl_hour > 23 {
            return Err(Error::Config(format!(
                "night_owl_hour must be within 0..=23, got {}",
                a.night_owl_hour
            )));
        }
        for (key, value) in [
            ("weight_increase_percent", a.weight_increase_percent),
            ("heavy_lift_kg", a.heavy_lift_kg),
            ("volume_target_kg", a.volume_target_kg),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!(
                    "{} must be a positive number, got {}",
                    key, value
                )));
            }
        }
        Ok(())
    }
}
