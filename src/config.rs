// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{DEFAULT_THRESHOLD_MM, timing};
use crate::errors::{SegmentError, SegmentResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Segmentation settings
///
/// Missing fields fall back to their defaults when deserializing, so a config
/// file only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Near/far cutoff in millimeters (distance > threshold is far)
    pub threshold: u32,
    /// Per-stream acquisition timeout in milliseconds
    pub acquire_timeout_ms: u64,
    /// Reset every layer to transparent black before compositing each frame
    pub clear_layers_each_frame: bool,
    /// Capture loop pacing in milliseconds
    pub frame_interval_ms: u64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD_MM,
            acquire_timeout_ms: timing::ACQUIRE_TIMEOUT.as_millis() as u64,
            clear_layers_each_frame: false, // Unwritten pixels keep their last value
            frame_interval_ms: timing::FRAME_INTERVAL.as_millis() as u64,
        }
    }
}

impl SegmentationConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Check that the settings can drive a pipeline
    pub fn validate(&self) -> SegmentResult<()> {
        if self.acquire_timeout_ms == 0 {
            return Err(SegmentError::Config(
                "acquire_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> SegmentResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> SegmentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> SegmentResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Write settings to a JSON file
    pub fn save(&self, path: &Path) -> SegmentResult<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
