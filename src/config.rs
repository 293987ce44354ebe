//! Configuration loading and types for voxcap
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/voxcap/config.toml)
//! 3. Environment variables (VOXCAP_*)
//! 4. CLI arguments (highest priority)

use crate::error::VoxcapError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Voxcap Configuration
#
# Location: ~/.config/voxcap/config.toml
# All settings can be overridden via CLI flags

[audio]
# Audio input device ("default" uses system default)
# Partial names match case-insensitively: "usb" matches "USB PnP Audio Device"
# List devices with: voxcap devices
device = "default"

# Sample rate of the finalized recording in Hz
sample_rate = 16000

# Requested capture channel count (1 = mono, 2 = stereo)
# Multi-channel input is averaged down to mono before silence analysis
channels = 1

[recording]
# RMS energy below which a frame counts as silence
silence_threshold = 0.01

# Seconds of continuous silence before the recording auto-stops
silence_duration_secs = 2.0

# Grace period before silence evaluation begins, so a breath or a slow
# start does not cut the recording short
min_recording_secs = 1.0

# Hard cap on recording length in seconds
max_recording_secs = 30.0

# Silence monitor tick interval in milliseconds
poll_interval_ms = 100

[feedback]
# Play start/stop chimes
enabled = true

# Chime volume (0.0 to 1.0)
volume = 0.7
"#;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub recording: RecordingConfig,

    #[serde(default)]
    pub feedback: FeedbackConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    /// Input device name, a case-insensitive substring of one, or "default"
    #[serde(default = "default_device")]
    pub device: String,

    /// Sample rate of the finalized recording in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Requested capture channel count (downmixed to mono before analysis)
    #[serde(default = "default_channels")]
    pub channels: u16,
}

/// Silence detection and session length policies
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordingConfig {
    /// RMS energy below which a frame counts as silence
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f32,

    /// Seconds of continuous silence before the recording auto-stops
    #[serde(default = "default_silence_duration")]
    pub silence_duration_secs: f32,

    /// Seconds to wait before silence evaluation begins
    #[serde(default = "default_min_recording")]
    pub min_recording_secs: f32,

    /// Maximum recording length in seconds
    #[serde(default = "default_max_recording")]
    pub max_recording_secs: f32,

    /// Silence monitor tick interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

/// Audio feedback configuration for the start/stop chimes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedbackConfig {
    /// Play start/stop chimes
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Chime volume (0.0 to 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_channels() -> u16 {
    1
}

fn default_silence_threshold() -> f32 {
    0.01
}

fn default_silence_duration() -> f32 {
    2.0
}

fn default_min_recording() -> f32 {
    1.0
}

fn default_max_recording() -> f32 {
    30.0
}

fn default_poll_interval() -> u64 {
    100
}

fn default_volume() -> f32 {
    0.7
}

fn default_true() -> bool {
    true
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            silence_threshold: default_silence_threshold(),
            silence_duration_secs: default_silence_duration(),
            min_recording_secs: default_min_recording(),
            max_recording_secs: default_max_recording(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            volume: default_volume(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "voxcap")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "voxcap")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, VoxcapError> {
    // Start with defaults
    let mut config = Config::default();

    // Determine config file path
    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    // Load from file if it exists
    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| VoxcapError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| VoxcapError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    // Override from environment variables
    if let Ok(device) = std::env::var("VOXCAP_DEVICE") {
        config.audio.device = device;
    }
    if let Ok(raw) = std::env::var("VOXCAP_MAX_SECS") {
        match raw.parse::<f32>() {
            Ok(secs) => config.recording.max_recording_secs = secs,
            Err(_) => tracing::warn!("Ignoring invalid VOXCAP_MAX_SECS: {:?}", raw),
        }
    }
    if let Ok(raw) = std::env::var("VOXCAP_SILENCE_SECS") {
        match raw.parse::<f32>() {
            Ok(secs) => config.recording.silence_duration_secs = secs,
            Err(_) => tracing::warn!("Ignoring invalid VOXCAP_SILENCE_SECS: {:?}", raw),
        }
    }

    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &Config, path: &Path) -> Result<(), VoxcapError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| VoxcapError::Config(format!("Failed to create config dir: {}", e)))?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| VoxcapError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(path, contents)
        .map_err(|e| VoxcapError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}
