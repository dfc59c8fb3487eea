//! Pipeline configuration

use crate::constants::{DEFAULT_COOLDOWN, DEFAULT_WORKER_QUEUE};
use crate::error::ScanError;
use crate::format::Format;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for a [`ScanPipeline`](crate::pipeline::ScanPipeline)
///
/// Every field has a default, so `{}` is a valid JSON configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Enabled symbologies, in priority order
    pub formats: Vec<Format>,
    /// Cooldown after an accepted detection, in milliseconds
    pub cooldown_ms: u64,
    /// Initial state of the scanning gate
    pub scanning_enabled: bool,
    /// Frames the analysis worker may queue before `submit` blocks
    pub worker_queue: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            formats: Format::all().to_vec(),
            cooldown_ms: DEFAULT_COOLDOWN.as_millis() as u64,
            scanning_enabled: true,
            worker_queue: DEFAULT_WORKER_QUEUE,
        }
    }
}

impl ScanConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ScanError> {
        let config: ScanConfig =
            serde_json::from_str(json).map_err(|e| ScanError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.formats.is_empty() {
            return Err(ScanError::InvalidConfig(
                "at least one barcode format must be enabled".into(),
            ));
        }
        if self.worker_queue == 0 {
            return Err(ScanError::InvalidConfig(
                "worker_queue must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Cooldown as a [`Duration`]
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}
