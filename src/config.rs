//! Capture configuration.
//!
//! Tunable acquisition and storage parameters as TOML, with built-in
//! defaults matching the device constants. Structural sizes (capture
//! length, spectrum bins, segment geometry, store capacity) are
//! compile-time constants and deliberately not configurable — the on-disk
//! record layout depends on them.
//!
//! The loaded config is plain data owned by the session; there is no
//! process-global configuration.

use crate::acquisition::{TriggerMode, TRIGGER_SCALE_MAX};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Root configuration for one logger deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Acquisition tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// How a run starts once armed.
    #[serde(default)]
    pub trigger_mode: TriggerMode,

    /// Minimum microseconds between accepted samples.
    #[serde(default = "defaults::min_sample_interval_us")]
    pub min_sample_interval_us: u64,

    /// External-trigger threshold on the 0–4095 ADC scale; a reading must
    /// exceed it to start a run.
    #[serde(default = "defaults::trigger_threshold")]
    pub trigger_threshold: u16,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            trigger_mode: TriggerMode::default(),
            min_sample_interval_us: defaults::min_sample_interval_us(),
            trigger_threshold: defaults::trigger_threshold(),
        }
    }
}

/// Storage location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the slot files and cursor record.
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn min_sample_interval_us() -> u64 {
        5000
    }

    pub fn trigger_threshold() -> u16 {
        4000
    }

    pub fn data_dir() -> PathBuf {
        PathBuf::from("./data/records")
    }
}

impl CaptureConfig {
    /// Load and validate a config file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        info!(path = %path.display(), "capture config loaded");
        Ok(config)
    }

    /// Check tunable fields for values the hardware cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.acquisition.min_sample_interval_us == 0 {
            return Err(ConfigError::Invalid(
                "acquisition.min_sample_interval_us must be positive".to_string(),
            ));
        }
        if self.acquisition.trigger_threshold > TRIGGER_SCALE_MAX {
            return Err(ConfigError::Invalid(format!(
                "acquisition.trigger_threshold {} exceeds ADC full scale {}",
                self.acquisition.trigger_threshold, TRIGGER_SCALE_MAX
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device_constants() {
        let config = CaptureConfig::default();
        assert_eq!(config.acquisition.trigger_mode, TriggerMode::SelfTrigger);
        assert_eq!(config.acquisition.min_sample_interval_us, 5000);
        assert_eq!(config.acquisition.trigger_threshold, 4000);
        assert_eq!(config.storage.data_dir, PathBuf::from("./data/records"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: CaptureConfig = toml::from_str(
            r#"
            [acquisition]
            trigger_mode = "external"
            "#,
        )
        .unwrap();
        assert_eq!(config.acquisition.trigger_mode, TriggerMode::External);
        assert_eq!(config.acquisition.min_sample_interval_us, 5000);
    }

    #[test]
    fn zero_interval_is_invalid() {
        let config: CaptureConfig = toml::from_str(
            r#"
            [acquisition]
            min_sample_interval_us = 0
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn over_scale_threshold_is_invalid() {
        let config: CaptureConfig = toml::from_str(
            r#"
            [acquisition]
            trigger_threshold = 4096
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
