//! Scheduler configuration and config file location.
//!
//! Config is a JSON file (`yuvtk.json`); every field is optional and falls
//! back to its default. Location priority:
//! 1. `--config-dir` from CLI
//! 2. Current directory, if it already contains `yuvtk.json`
//! 3. Platform config directory (`dirs_next::config_dir()/yuvtk`)
//! 4. `.`

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::speed::{DEFAULT_MAX_SAMPLE_MS, DEFAULT_SMOOTHING};
use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "yuvtk.json";

/// Tick period of the render loop (ms)
pub const DEFAULT_TICK_PERIOD_MS: u64 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Render tick period in milliseconds (target, not deadline)
    pub tick_period_ms: u64,
    /// EMA factor for the playback speed estimate
    pub speed_smoothing: f32,
    /// Deltas above this (ms) are treated as pause/seek and ignored
    pub speed_max_sample_ms: u32,
    /// Pending scene limit; `None` replays every scene (unbounded)
    pub max_pending_scenes: Option<usize>,
    /// Capacity for channel subscriptions created by hosts
    pub event_channel_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            speed_smoothing: DEFAULT_SMOOTHING,
            speed_max_sample_ms: DEFAULT_MAX_SAMPLE_MS,
            max_pending_scenes: None,
            event_channel_capacity: 64,
        }
    }
}

impl SchedulerConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ms == 0 {
            return Err(ConfigError::Invalid("tick_period_ms must be > 0".into()));
        }
        if !(self.speed_smoothing > 0.0 && self.speed_smoothing <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "speed_smoothing must be in (0, 1], got {}",
                self.speed_smoothing
            )));
        }
        if self.speed_max_sample_ms == 0 {
            return Err(ConfigError::Invalid("speed_max_sample_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load and validate config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config file, or defaults if it doesn't exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Path overrides (from CLI)
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    pub config_dir: Option<PathBuf>,
}

/// Full path of a file in the config directory
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    get_config_dir(config).join(name)
}

fn get_config_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir() {
        if current_dir.join(CONFIG_FILE).exists() {
            return current_dir;
        }
    }

    if let Some(dir) = dirs_next::config_dir() {
        return dir.join("yuvtk");
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.tick_period(), Duration::from_millis(8));
        assert_eq!(config.speed_smoothing, 0.1);
        assert_eq!(config.speed_max_sample_ms, 1000);
        assert_eq!(config.max_pending_scenes, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SchedulerConfig::from_json(r#"{ "tick_period_ms": 16, "max_pending_scenes": 4 }"#).unwrap();
        assert_eq!(config.tick_period_ms, 16);
        assert_eq!(config.max_pending_scenes, Some(4));
        assert_eq!(config.speed_smoothing, 0.1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = SchedulerConfig { tick_period_ms: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = SchedulerConfig { speed_smoothing: 1.5, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_load_and_missing_file() {
        let dir = std::env::temp_dir().join(format!("yuvtk_config_test_{}", std::process::id()));
        let path = dir.join(CONFIG_FILE);
        let _ = std::fs::remove_file(&path);

        assert_eq!(SchedulerConfig::load_or_default(&path).unwrap(), SchedulerConfig::default());

        let config = SchedulerConfig { tick_period_ms: 20, ..Default::default() };
        config.save(&path).unwrap();
        assert_eq!(SchedulerConfig::load(&path).unwrap(), config);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(SchedulerConfig::load(&path), Err(ConfigError::Parse { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_config_file_with_custom_dir() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };
        assert_eq!(config_file("yuvtk.json", &config), PathBuf::from("/custom/yuvtk.json"));
    }
}
