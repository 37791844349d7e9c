// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player configuration.
//!
//! Stored as RON. Missing fields take their defaults so a configuration file
//! only needs to name what it changes.

use crate::recording::RecordingSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current configuration format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Initial player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Configuration format version
    pub version: u32,
    /// Initial speed multiplier
    pub speed: f64,
    /// Wrap at the end of the timeline
    pub loop_playback: bool,
    /// Recording settings
    pub recording: RecordingSettings,
    /// Wall-clock interval between host ticks, in milliseconds
    pub tick_interval_ms: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            speed: 1.0,
            loop_playback: false,
            recording: RecordingSettings::default(),
            tick_interval_ms: 1000.0 / 60.0,
        }
    }
}

impl PlayerConfig {
    /// Parse and validate a RON configuration
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let config: PlayerConfig = ron::from_str(content)?;

        if config.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::debug!("Loaded player config from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "speed must be positive, got {}",
                self.speed
            )));
        }
        if !self.recording.countdown.is_finite() || self.recording.countdown < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "recording countdown must be non-negative, got {}",
                self.recording.countdown
            )));
        }
        if !self.tick_interval_ms.is_finite() || self.tick_interval_ms <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tick interval must be positive, got {}",
                self.tick_interval_ms
            )));
        }
        Ok(())
    }
}

/// Error loading or saving a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// RON syntax or shape error
    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON serialization failed
    #[error("Config serialize error: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version
    #[error("Config version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version understood
        supported: u32,
    },

    /// A value is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}
