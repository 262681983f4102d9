use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::effects::EffectSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub target_tps: u32,
    /// `0` runs until the world stops on its own.
    pub max_ticks: u64,
    pub spikes_interval_seconds: f32,
    pub spikes_damage: i32,
    pub invincibility_window_seconds: f32,
    pub max_path_expansions: usize,
    pub pathfinder_pool_size: usize,
    pub room_width: u32,
    pub room_height: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        let effects = EffectSettings::default();
        Self {
            target_tps: 60,
            max_ticks: 600,
            spikes_interval_seconds: effects.spikes_interval_seconds,
            spikes_damage: effects.spikes_damage,
            invincibility_window_seconds: effects.invincibility_window_seconds,
            max_path_expansions: 4_096,
            pathfinder_pool_size: 4,
            room_width: 32,
            room_height: 18,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("config field {field} {message}")]
    Invalid {
        field: &'static str,
        message: &'static str,
    },
}

impl SimConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config: Self = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let path = error.path().to_string();
            ConfigError::Parse {
                path,
                message: error.into_inner().to_string(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_tps == 0 {
            return Err(ConfigError::Invalid {
                field: "target_tps",
                message: "must be greater than zero",
            });
        }
        if self.spikes_interval_seconds <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "spikes_interval_seconds",
                message: "must be greater than zero",
            });
        }
        if self.invincibility_window_seconds < 0.0 {
            return Err(ConfigError::Invalid {
                field: "invincibility_window_seconds",
                message: "must not be negative",
            });
        }
        if self.max_path_expansions == 0 {
            return Err(ConfigError::Invalid {
                field: "max_path_expansions",
                message: "must be greater than zero",
            });
        }
        if self.pathfinder_pool_size == 0 {
            return Err(ConfigError::Invalid {
                field: "pathfinder_pool_size",
                message: "must be greater than zero",
            });
        }
        if self.room_width < 3 || self.room_height < 3 {
            return Err(ConfigError::Invalid {
                field: "room_width/room_height",
                message: "must be at least 3",
            });
        }
        Ok(())
    }

    pub fn fixed_dt(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_tps.max(1)))
    }

    pub fn effect_settings(&self) -> EffectSettings {
        EffectSettings {
            spikes_interval_seconds: self.spikes_interval_seconds,
            spikes_damage: self.spikes_damage,
            invincibility_window_seconds: self.invincibility_window_seconds,
        }
    }
}
