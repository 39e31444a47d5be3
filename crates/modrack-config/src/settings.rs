//! Engine and audio device settings.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use modrack_core::EngineConfig;

/// Persistent engine settings.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000.0
/// block_size = 256
/// max_modules = 256
/// max_cables = 1024
/// cpu_meter = false
///
/// [audio]
/// output_device = "default"
/// channels = 2
/// ```
///
/// Every field is optional; missing fields take the engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Engine sample rate in Hz.
    pub sample_rate: f32,
    /// Engine block size in frames.
    pub block_size: usize,
    /// Maximum number of modules in the rack.
    pub max_modules: usize,
    /// Maximum number of cables in the rack.
    pub max_cables: usize,
    /// Capacity of the command queue.
    pub command_capacity: usize,
    /// Capacity of the engine event queue.
    pub event_capacity: usize,
    /// Capacity of the deferred-drop queue.
    pub garbage_capacity: usize,
    /// Number of params that may be smoothed at once.
    pub max_smoothing: usize,
    /// Measure per-module processing time.
    pub cpu_meter: bool,
    /// Audio device selection.
    pub audio: AudioSettings,
}

/// Audio device selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSettings {
    /// Output device name; the system default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
    /// Input device name; no input stream when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_device: Option<String>,
    /// Number of device channels to open.
    pub channels: u16,
    /// Requested device buffer size in frames; the device default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<u32>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            output_device: None,
            input_device: None,
            channels: 2,
            buffer_size: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_engine_config(&EngineConfig::default())
    }
}

impl Settings {
    /// Build settings from an engine configuration with default audio settings.
    pub fn from_engine_config(config: &EngineConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            block_size: config.block_size,
            max_modules: config.max_modules,
            max_cables: config.max_cables,
            command_capacity: config.command_capacity,
            event_capacity: config.event_capacity,
            garbage_capacity: config.garbage_capacity,
            max_smoothing: config.max_smoothing,
            cpu_meter: config.cpu_meter,
            audio: AudioSettings::default(),
        }
    }

    /// Convert to a validated engine configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSettings`] if the engine would reject
    /// the configuration.
    pub fn to_engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let config = EngineConfig {
            sample_rate: self.sample_rate,
            block_size: self.block_size,
            max_modules: self.max_modules,
            max_cables: self.max_cables,
            command_capacity: self.command_capacity,
            event_capacity: self.event_capacity,
            garbage_capacity: self.garbage_capacity,
            max_smoothing: self.max_smoothing,
            cpu_meter: self.cpu_meter,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load settings from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "settings file missing, using defaults");
            Ok(Self::default())
        }
    }

    /// Load settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the settings to a TOML file, creating the parent directory.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine() {
        let config = Settings::default().to_engine_config().unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings = Settings::from_toml(
            r#"
            sample_rate = 44100.0

            [audio]
            output_device = "USB Interface"
            "#,
        )
        .unwrap();
        assert_eq!(settings.sample_rate, 44100.0);
        assert_eq!(settings.block_size, EngineConfig::default().block_size);
        assert_eq!(settings.audio.output_device.as_deref(), Some("USB Interface"));
        assert_eq!(settings.audio.channels, 2);
        assert_eq!(settings.audio.input_device, None);
    }

    #[test]
    fn test_invalid_engine_values_are_rejected() {
        let settings = Settings {
            block_size: 0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.to_engine_config(),
            Err(ConfigError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut settings = Settings::default();
        settings.cpu_meter = true;
        settings.audio.buffer_size = Some(128);
        let parsed = Settings::from_toml(&settings.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_bad_toml_is_error() {
        assert!(matches!(
            Settings::from_toml("block_size = \"large\""),
            Err(ConfigError::TomlParse(_))
        ));
    }
}
