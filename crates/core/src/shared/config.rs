use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    CHUNK_SIZE, DEFAULT_INPUT_PATH, DEFAULT_MAX_EMPTY_LOOPS, DEFAULT_TICK_RATE,
    DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, FRAME_PERIOD_CALIBRATION, FRAME_PERIOD_TIME_BASE,
};
use crate::shared::error::{PlaybackError, Result};

/// Player settings. Every field has a default, so a config file only needs
/// to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub input: PathBuf,
    pub chunk_size: usize,
    pub tick_rate: u32,
    pub calibration_constant: f64,
    pub time_base: f64,
    pub window_width: u32,
    pub window_height: u32,
    pub max_empty_loops: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_PATH),
            chunk_size: CHUNK_SIZE,
            tick_rate: DEFAULT_TICK_RATE,
            calibration_constant: FRAME_PERIOD_CALIBRATION,
            time_base: FRAME_PERIOD_TIME_BASE,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            max_empty_loops: DEFAULT_MAX_EMPTY_LOOPS,
        }
    }
}

impl PlayerConfig {
    /// `<config dir>/ReelLoop/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ReelLoop").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| PlaybackError::Config(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| PlaybackError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file at `default_path()` if it exists, defaults otherwise.
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PlaybackError::Config(e.to_string()))?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| PlaybackError::Config(e.to_string()))?;
        fs::write(path, json).map_err(|e| PlaybackError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(PlaybackError::Config("chunk_size must be positive".into()));
        }
        if self.tick_rate == 0 {
            return Err(PlaybackError::Config("tick_rate must be positive".into()));
        }
        if !(self.calibration_constant > 0.0) {
            return Err(PlaybackError::Config(format!(
                "calibration_constant must be positive, got {}",
                self.calibration_constant
            )));
        }
        if !(self.time_base > 0.0) {
            return Err(PlaybackError::Config(format!(
                "time_base must be positive, got {}",
                self.time_base
            )));
        }
        if self.max_empty_loops == 0 {
            return Err(PlaybackError::Config(
                "max_empty_loops must be at least 1 so the stream can rewind".into(),
            ));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(PlaybackError::Config(format!(
                "window size must be positive, got {}x{}",
                self.window_width, self.window_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_match_constants() {
        let config = PlayerConfig::default();
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.tick_rate, 60);
        assert_relative_eq!(config.calibration_constant, 37.04);
        assert_relative_eq!(config.time_base, 1000.0);
        assert_eq!((config.window_width, config.window_height), (1280, 720));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "input": "clips/loop.m2v", "tick_rate": 30 }"#).unwrap();

        let config = PlayerConfig::load(&path).unwrap();
        assert_eq!(config.input, PathBuf::from("clips/loop.m2v"));
        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.chunk_size, 4096);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = PlayerConfig {
            chunk_size: 1024,
            ..PlayerConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(PlayerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = PlayerConfig::load(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(PlaybackError::Config(_))));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "chunk_size": 0 }"#).unwrap();
        assert!(PlayerConfig::load(&path).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_tick_rate() {
        let config = PlayerConfig {
            tick_rate: 0,
            ..PlayerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan_calibration() {
        let config = PlayerConfig {
            calibration_constant: f64::NAN,
            ..PlayerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_empty_loop_budget() {
        let config = PlayerConfig {
            max_empty_loops: 0,
            ..PlayerConfig::default()
        };
        assert!(matches!(config.validate(), Err(PlaybackError::Config(_))));

        let config = PlayerConfig {
            max_empty_loops: 1,
            ..PlayerConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
