//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::display::Rgb;
use crate::error::{Result, SenseLoopError};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub joystick: JoystickConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub recording: RecordingConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

/// Sampling pipeline configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Fixed sampling period in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Reference sea-level pressure (P0) for the altitude derivation, in hPa
    #[serde(default = "default_sea_level_pressure")]
    pub sea_level_pressure_hpa: f64,
}

/// Joystick polling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct JoystickConfig {
    /// Device poll period in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// LED display configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Mode-transition window (blanking + debounce) in milliseconds
    #[serde(default = "default_transition_duration_ms")]
    pub transition_duration_ms: u64,

    /// RGB color of the transient mode-number indicator
    #[serde(default = "default_indicator_color")]
    pub indicator_color: [u8; 3],
}

/// CSV recording configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RecordingConfig {
    /// Directory where session files are created
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

/// Outward publish channel configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PublishConfig {
    /// Sample channel capacity before frames are dropped
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

// Default value functions
fn default_interval_ms() -> u64 { 100 }
fn default_sea_level_pressure() -> f64 { 1013.25 }

fn default_poll_interval_ms() -> u64 { 100 }

fn default_transition_duration_ms() -> u64 { 500 }
fn default_indicator_color() -> [u8; 3] { [0, 0, 255] }

fn default_log_dir() -> String { "./logs".to_string() }

fn default_channel_capacity() -> usize { 32 }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            sea_level_pressure_hpa: default_sea_level_pressure(),
        }
    }
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            transition_duration_ms: default_transition_duration_ms(),
            indicator_color: default_indicator_color(),
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            joystick: JoystickConfig::default(),
            display: DisplayConfig::default(),
            recording: RecordingConfig::default(),
            publish: PublishConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, TOML parsing fails, or
    /// validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist. Parse and validation errors still propagate.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Sampling period as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.pipeline.interval_ms)
    }

    /// Joystick poll period as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.joystick.poll_interval_ms)
    }

    /// Mode-transition window as a [`Duration`].
    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.display.transition_duration_ms)
    }

    /// Mode-number indicator color as an [`Rgb`].
    pub fn indicator_color(&self) -> Rgb {
        let [r, g, b] = self.display.indicator_color;
        Rgb::new(r, g, b)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.pipeline.interval_ms == 0 || self.pipeline.interval_ms > 60000 {
            return Err(SenseLoopError::Config(toml::de::Error::custom(
                "interval_ms must be between 1 and 60000",
            )));
        }

        if self.pipeline.sea_level_pressure_hpa <= 0.0 {
            return Err(SenseLoopError::Config(toml::de::Error::custom(
                "sea_level_pressure_hpa must be positive",
            )));
        }

        if self.joystick.poll_interval_ms == 0 || self.joystick.poll_interval_ms > 60000 {
            return Err(SenseLoopError::Config(toml::de::Error::custom(
                "poll_interval_ms must be between 1 and 60000",
            )));
        }

        if self.display.transition_duration_ms == 0 || self.display.transition_duration_ms > 10000
        {
            return Err(SenseLoopError::Config(toml::de::Error::custom(
                "transition_duration_ms must be between 1 and 10000",
            )));
        }

        if self.recording.log_dir.is_empty() {
            return Err(SenseLoopError::Config(toml::de::Error::custom(
                "log_dir cannot be empty",
            )));
        }

        if self.publish.channel_capacity == 0 {
            return Err(SenseLoopError::Config(toml::de::Error::custom(
                "channel_capacity must be greater than 0",
            )));
        }

        Ok(())
    }
}
