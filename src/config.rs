//! Studio configuration.
//!
//! Stored as JSON. Every field has a default, so a partial file (or none at
//! all) is valid.

use crate::audio::decode::{ENGINE_CHANNELS, ENGINE_SAMPLE_RATE};
use crate::error::StudioError;
use crate::playback::{BackgroundCatalog, DEFAULT_MIXING_LEVEL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Runtime configuration for the studio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Declared engine sample rate, used when a payload omits it.
    pub sample_rate: u32,

    /// Declared engine channel count, used when a payload omits it.
    pub channel_count: u16,

    /// Background level when a request does not specify one.
    pub default_mixing_level: f32,

    /// Selectable background tracks. Must contain `none`.
    pub background_tracks: BackgroundCatalog,

    /// How often the CLI checks whether the voice has finished.
    pub poll_interval_ms: u64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: ENGINE_SAMPLE_RATE,
            channel_count: ENGINE_CHANNELS,
            default_mixing_level: DEFAULT_MIXING_LEVEL,
            background_tracks: BackgroundCatalog::default(),
            poll_interval_ms: 50,
        }
    }
}

impl StudioConfig {
    /// Checks value ranges and catalog consistency.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::Config` describing the first problem found.
    pub fn validate(&self) -> Result<(), StudioError> {
        if self.sample_rate == 0 {
            return Err(StudioError::Config("sample_rate must be positive".into()));
        }
        if self.channel_count == 0 {
            return Err(StudioError::Config("channel_count must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.default_mixing_level) {
            return Err(StudioError::Config(format!(
                "default_mixing_level {} is outside [0, 1]",
                self.default_mixing_level
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(StudioError::Config(
                "poll_interval_ms must be positive".into(),
            ));
        }
        self.background_tracks
            .validate()
            .map_err(StudioError::Config)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, StudioError> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file writing fails.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), StudioError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
