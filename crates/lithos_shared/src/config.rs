//! # World Configuration
//!
//! Loaded once at startup from TOML and treated as read-only afterwards.
//! Every field has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! world_name = "overworld"
//! save_path = "saves"
//! chunk_size = 32
//! render_distance = 3
//! min_save_interval_ms = 30000
//! light_model = "propagated"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MIN_SAVE_INTERVAL, DEFAULT_RENDER_DISTANCE, DEFAULT_STREAM_TICK,
    SMOOTHING_BORDER, STREAM_SEARCH_RADIUS,
};

/// Errors raised while loading a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which light propagation model the world uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightModel {
    /// Per-column sun/shadow approximation.
    Column,
    /// Packed RGB light with sources, sunlight and per-hop dimming.
    #[default]
    Propagated,
}

/// Runtime configuration of a world.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Chunk edge length in tiles.
    pub chunk_size: u32,
    /// Chebyshev distance in chunks beyond which streamed chunks are evicted.
    pub render_distance: u32,
    /// Minimum delay before a dirty chunk is written, in milliseconds.
    pub min_save_interval_ms: u64,
    /// Streaming worker interval, in milliseconds.
    pub stream_tick_ms: u64,
    /// Name of the world; also the directory under `save_path`.
    pub world_name: String,
    /// Root directory for saved worlds.
    pub save_path: PathBuf,
    /// Seed used when no world-info record exists yet.
    pub seed: u64,
    /// Light propagation model.
    pub light_model: LightModel,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            render_distance: DEFAULT_RENDER_DISTANCE,
            min_save_interval_ms: u64::try_from(DEFAULT_MIN_SAVE_INTERVAL.as_millis())
                .unwrap_or(u64::MAX),
            stream_tick_ms: u64::try_from(DEFAULT_STREAM_TICK.as_millis()).unwrap_or(u64::MAX),
            world_name: "world".to_string(),
            save_path: PathBuf::from("saves"),
            seed: 0xDEAD_BEEF_CAFE_BABE,
            light_model: LightModel::default(),
        }
    }
}

impl WorldConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or a value is out of range.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails validation.
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        let min_size = u32::try_from(SMOOTHING_BORDER * 2).unwrap_or(u32::MAX);
        if self.chunk_size < min_size {
            return Err(ConfigError::Invalid(format!(
                "chunk_size {} must be at least {min_size}",
                self.chunk_size
            )));
        }
        if i32::try_from(self.chunk_size).is_err() {
            return Err(ConfigError::Invalid(format!(
                "chunk_size {} is too large",
                self.chunk_size
            )));
        }
        let min_distance = STREAM_SEARCH_RADIUS.unsigned_abs();
        if self.render_distance < min_distance {
            return Err(ConfigError::Invalid(format!(
                "render_distance {} must be at least {min_distance}",
                self.render_distance
            )));
        }
        if self.stream_tick_ms == 0 {
            return Err(ConfigError::Invalid("stream_tick_ms must be positive".to_string()));
        }
        if self.world_name.is_empty() {
            return Err(ConfigError::Invalid("world_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Chunk edge length as a signed tile count.
    #[must_use]
    pub fn chunk_size_i32(&self) -> i32 {
        i32::try_from(self.chunk_size).unwrap_or(i32::MAX)
    }

    /// Minimum save interval as a duration.
    #[must_use]
    pub const fn min_save_interval(&self) -> Duration {
        Duration::from_millis(self.min_save_interval_ms)
    }

    /// Streaming worker interval as a duration.
    #[must_use]
    pub const fn stream_tick(&self) -> Duration {
        Duration::from_millis(self.stream_tick_ms)
    }

    /// Directory holding this world's files.
    #[must_use]
    pub fn world_dir(&self) -> PathBuf {
        self.save_path.join(&self.world_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = WorldConfig::from_toml_str("").unwrap();
        assert_eq!(config, WorldConfig::default());
        assert_eq!(config.min_save_interval(), DEFAULT_MIN_SAVE_INTERVAL);
    }

    #[test]
    fn test_overrides() {
        let config = WorldConfig::from_toml_str(
            r#"
            world_name = "overworld"
            chunk_size = 64
            render_distance = 5
            light_model = "column"
            "#,
        )
        .unwrap();

        assert_eq!(config.world_name, "overworld");
        assert_eq!(config.chunk_size_i32(), 64);
        assert_eq!(config.render_distance, 5);
        assert_eq!(config.light_model, LightModel::Column);
        assert_eq!(config.world_dir(), PathBuf::from("saves").join("overworld"));
    }

    #[test]
    fn test_rejects_tiny_chunks() {
        let err = WorldConfig::from_toml_str("chunk_size = 4").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_short_render_distance() {
        let err = WorldConfig::from_toml_str("render_distance = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_syntax() {
        let err = WorldConfig::from_toml_str("chunk_size = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = WorldConfig::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
