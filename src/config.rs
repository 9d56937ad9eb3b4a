//! Driver configuration
//!
//! Every section falls back to defaults, so a partial or missing file still
//! yields a usable driver. Host settings (IPD, stereo layout) are applied on
//! top of this at device construction.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::input::{AxisBindings, InputIdentity};
use crate::pose::DEFAULT_POSE_TIME_OFFSET;

const CONFIG_DIR: &str = "glyph-driver";
const CONFIG_FILE: &str = "driver.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct DriverConfig {
    pub device: DeviceConfig,
    pub input: InputConfig,
    pub polling: PollingConfig,
    pub display: DisplayConfig,
    pub pose: PoseConfig,
    pub logging: LoggingConfig,
}

/// Identity reported to the host
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DeviceConfig {
    pub serial_number: String,
    pub model_number: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            serial_number: "Glyph001".to_string(),
            model_number: "Avegant Glyph".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub identity: InputIdentity,
    pub bindings: AxisBindings,
}

/// Poll loop timing, in microseconds
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between samples while a device is active
    pub interval_us: u64,
    /// Delay while no valid device index is assigned
    pub idle_interval_us: u64,
    /// Period of the publish statistics log line
    pub stats_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_us: 250,
            idle_interval_us: 1_000_000,
            stats_interval_secs: 10,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_micros(self.interval_us)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_micros(self.idle_interval_us)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}

/// Fallback display geometry when no monitor probe finds the headset
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub window_x: i32,
    pub window_y: i32,
    pub window_width: u32,
    pub window_height: u32,
    pub refresh_rate: f32,
    pub seconds_from_vsync_to_photons: f32,
    /// Used when the host has no side-by-side setting
    pub side_by_side: bool,
    pub monitor_id_prefix: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_x: 0,
            window_y: 0,
            window_width: 1280,
            window_height: 720,
            refresh_rate: 60.0,
            seconds_from_vsync_to_photons: 0.0,
            side_by_side: false,
            monitor_id_prefix: "MONITOR\\AVG0065".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PoseConfig {
    pub time_offset_secs: f64,
    /// Must not be 0 (invalid) or 1 when sharing a universe with other runtimes
    pub universe_id: u64,
    pub head_to_eye_depth_meters: f32,
    /// Used when the host has no IPD setting
    pub default_ipd_meters: f32,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            time_offset_secs: DEFAULT_POSE_TIME_OFFSET,
            universe_id: 1,
            head_to_eye_depth_meters: 0.0,
            default_ipd_meters: 0.063,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive for the driver log
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl DriverConfig {
    /// `<config dir>/glyph-driver/driver.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| eyre!("Failed to parse driver config: {}", e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let config = Self::from_toml(&content)?;
        info!("Loaded driver config from {}", path.display());
        Ok(config)
    }

    /// Loads `path`, degrading to defaults if it is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize driver config: {}", e))?;
        std::fs::write(path, content)
            .map_err(|e| eyre!("Failed to write config file {}: {}", path.display(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::AxisChannel;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = DriverConfig::from_toml(
            r#"
            [device]
            serial_number = "Glyph042"

            [input.bindings.z]
            channel = "RightStickY"

            [polling]
            interval_us = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.device.serial_number, "Glyph042");
        assert_eq!(config.device.model_number, "Avegant Glyph");
        assert_eq!(config.input.bindings.z.channel, AxisChannel::RightStickY);
        assert!(!config.input.bindings.z.invert);
        assert_eq!(config.input.bindings.x.channel, AxisChannel::LeftZ);
        assert_eq!(config.polling.interval(), Duration::from_micros(500));
        assert_eq!(config.polling.idle_interval(), Duration::from_secs(1));
        assert_eq!(config.input.identity.vendor_id, 0x2C43);
    }

    #[test]
    fn logging_and_display_sections() {
        let config = DriverConfig::from_toml(
            r#"
            [logging]
            filter = "glyph_driver=debug"

            [display]
            monitor_id_prefix = 'MONITOR\AVG0066'
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.filter, "glyph_driver=debug");
        assert_eq!(config.display.monitor_id_prefix, "MONITOR\\AVG0066");
        assert_eq!(config.polling.stats_interval(), Duration::from_secs(10));

        let defaults = DriverConfig::default();
        assert_eq!(defaults.logging.filter, "info");
        assert_eq!(defaults.display.monitor_id_prefix, "MONITOR\\AVG0065");
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(DriverConfig::from_toml("[device\nserial_number = 1").is_err());
    }

    #[test]
    fn saves_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = DriverConfig::default();
        config.display.side_by_side = true;
        config.pose.universe_id = 7;
        config.save(&path).unwrap();

        assert_eq!(DriverConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "this is = = not toml").unwrap();

        assert_eq!(DriverConfig::load_or_default(&path), DriverConfig::default());
        assert_eq!(
            DriverConfig::load_or_default(&dir.path().join("missing.toml")),
            DriverConfig::default()
        );
    }
}
