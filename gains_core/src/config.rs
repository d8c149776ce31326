//! Configuration file support for Gains.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/gains/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub timer: TimerConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,

    #[serde(default)]
    pub resume: ResumeConfig,

    #[serde(default)]
    pub units: UnitsConfig,
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

/// Rest timer defaults and completion alerts
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: u32,

    #[serde(default = "default_true")]
    pub sound_enabled: bool,

    #[serde(default = "default_true")]
    pub vibration_enabled: bool,

    #[serde(default)]
    pub notifications_enabled: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_rest_seconds: default_rest_seconds(),
            sound_enabled: true,
            vibration_enabled: true,
            notifications_enabled: false,
        }
    }
}

/// Gesture navigation; one threshold shared by every swipe surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavigationConfig {
    #[serde(default = "default_swipe_threshold_px")]
    pub swipe_threshold_px: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            swipe_threshold_px: default_swipe_threshold_px(),
        }
    }
}

/// Resume window heuristic: per-set allowance plus a fixed buffer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResumeConfig {
    #[serde(default = "default_seconds_per_set")]
    pub seconds_per_set: i64,

    #[serde(default = "default_buffer_minutes")]
    pub buffer_minutes: i64,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            seconds_per_set: default_seconds_per_set(),
            buffer_minutes: default_buffer_minutes(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

impl WeightUnit {
    pub fn label(self) -> &'static str {
        match self {
            WeightUnit::Kg => "KG",
            WeightUnit::Lbs => "LBS",
        }
    }
}

/// Display units
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct UnitsConfig {
    #[serde(default)]
    pub weight_unit: WeightUnit,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("gains")
}

fn default_rest_seconds() -> u32 {
    90
}

fn default_true() -> bool {
    true
}

fn default_swipe_threshold_px() -> f64 {
    50.0
}

fn default_seconds_per_set() -> i64 {
    135
}

fn default_buffer_minutes() -> i64 {
    20
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
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the session engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.navigation.swipe_threshold_px >= 0.0) {
            return Err(Error::Config(format!(
                "swipe_threshold_px must be non-negative, got {}",
                self.navigation.swipe_threshold_px
            )));
        }
        if self.resume.seconds_per_set < 0 || self.resume.buffer_minutes < 0 {
            return Err(Error::Config(
                "resume window parameters must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("gains").join("config.toml")
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
}
