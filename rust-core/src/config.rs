//! Scan configuration
//!
//! Every field has a default, so `{}` is a valid configuration document.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::bands::{BandTable, BandTablePreset};
use crate::report::ClassificationPolicy;
use crate::spectrum::WindowType;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    /// Bins per spectrum frame
    pub bin_count: usize,

    /// Capture length, counted in frames at the device's sample rate
    pub duration_limit_ms: u64,

    pub band_table: BandTablePreset,

    pub policy: ClassificationPolicy,

    pub window_type: WindowType,

    /// Ring buffer between the driver callback and the session, in samples
    pub ring_buffer_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            bin_count: 1024,
            duration_limit_ms: 15_000,
            band_table: BandTablePreset::Voice,
            policy: ClassificationPolicy::default(),
            window_type: WindowType::Hann,
            ring_buffer_capacity: 96_000,
        }
    }
}

impl ScanConfig {
    /// Parse and validate a JSON object
    ///
    /// Arrays are refused even though serde would map them onto fields by
    /// position.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(ConfigError::Invalid("config must be a JSON object".into()));
        }
        let config: ScanConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bin_count == 0 {
            return Err(ConfigError::Invalid("binCount must be greater than 0".into()));
        }
        if self.ring_buffer_capacity < self.bin_count * 2 {
            return Err(ConfigError::Invalid(format!(
                "ringBufferCapacity must hold at least one block of {} samples",
                self.bin_count * 2
            )));
        }
        match self.policy {
            ClassificationPolicy::RelativeRank { k } if k == 0 => {
                Err(ConfigError::Invalid("policy.k must be at least 1".into()))
            }
            ClassificationPolicy::AbsoluteThreshold { epsilon } if !(epsilon >= 0.0) => {
                Err(ConfigError::Invalid("policy.epsilon must be non-negative".into()))
            }
            _ => Ok(()),
        }
    }

    pub fn table(&self) -> BandTable {
        BandTable::from_preset(self.band_table)
    }
}
