// SPDX-License-Identifier: GPL-3.0-only

//! Media processor configuration

use crate::constants::{
    DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY, MAX_PROCESSOR_FILTERS, MIN_JPEG_QUALITY,
    WORKER_THREAD_NAME,
};
use crate::errors::{ImagingError, ImagingResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Tunables for a media processor
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Maximum number of filters in one pipeline (companion filters count too)
    pub max_filters: usize,
    /// Quality assigned to converters created by the CLI
    pub default_jpeg_quality: u8,
    /// Name given to pipeline worker threads
    pub worker_thread_name: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_filters: MAX_PROCESSOR_FILTERS,
            default_jpeg_quality: DEFAULT_JPEG_QUALITY,
            worker_thread_name: WORKER_THREAD_NAME.to_string(),
        }
    }
}

impl ProcessorConfig {
    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> ImagingResult<Self> {
        let config: ProcessorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load(path: &Path) -> ImagingResult<Self> {
        debug!(path = %path.display(), "Loading processor config");
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the processor cannot run with
    pub fn validate(&self) -> ImagingResult<()> {
        if self.max_filters == 0 {
            return Err(ImagingError::invalid("max_filters must be at least 1"));
        }
        if !(MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&self.default_jpeg_quality) {
            return Err(ImagingError::invalid(format!(
                "default_jpeg_quality {} outside {}..={}",
                self.default_jpeg_quality, MIN_JPEG_QUALITY, MAX_JPEG_QUALITY
            )));
        }
        if self.worker_thread_name.is_empty() {
            return Err(ImagingError::invalid("worker_thread_name is empty"));
        }
        Ok(())
    }
}
