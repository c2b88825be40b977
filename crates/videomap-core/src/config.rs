//! Application configuration
//!
//! Loaded from a TOML file; every field has a default so a missing or partial
//! file still yields a usable configuration.

use crate::logging::LogConfig;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Repeat count handed to the decoder when a polygon loops
pub const DEFAULT_LOOP_REPEAT_COUNT: u32 = 65535;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging settings
    pub log: LogConfig,
    /// Playback and timeline settings
    pub playback: PlaybackConfig,
    /// Canvas size for new projects
    pub canvas: CanvasConfig,
}

/// Playback and scheduling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Scene timeline tick interval in milliseconds
    pub timeline_tick_ms: u64,
    /// Repeat option used when the loop flag is set
    pub loop_repeat_count: u32,
    /// Explicit location of the native decoder library
    pub decoder_library_path: Option<PathBuf>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            timeline_tick_ms: 50,
            loop_repeat_count: DEFAULT_LOOP_REPEAT_COUNT,
            decoder_library_path: None,
        }
    }
}

impl PlaybackConfig {
    /// Tick interval, never zero
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.timeline_tick_ms.max(1))
    }
}

/// Canvas size for new projects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Canvas width in pixels
    pub default_width: u32,
    /// Canvas height in pixels
    pub default_height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            default_width: 1920,
            default_height: 1080,
        }
    }
}

impl AppConfig {
    /// `<config dir>/videomap/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("videomap").join("config.toml"))
    }

    /// Parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = toml::from_str(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path`, or the default location when `None`. A missing file
    /// yields defaults; a present but unreadable one is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[playback]\ntimeline_tick_ms = 20\n\n[log]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.playback.tick_interval(), Duration::from_millis(20));
        assert_eq!(config.playback.loop_repeat_count, 65535);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.canvas, CanvasConfig::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "playback = 3").unwrap();
        assert!(AppConfig::load_or_default(Some(&path)).is_err());
    }
}
