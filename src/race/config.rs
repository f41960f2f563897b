use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::raster::CompareConfig;

use super::classifier::ClassifierConfig;
use super::state_machine::RaceConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to turn a video into events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub compare: CompareConfig,
    pub classifier: ClassifierConfig,
    pub race: RaceConfig,
    /// Classify frames on a thread pool; events are still produced in order.
    pub parallel: bool,
    pub workers: usize,
    /// Frames classified per parallel batch.
    pub batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            compare: CompareConfig::default(),
            classifier: ClassifierConfig::default(),
            race: RaceConfig::default(),
            parallel: false,
            workers: num_cpus::get(),
            batch_size: 64,
        }
    }
}

impl PipelineConfig {
    pub fn for_pal() -> Self {
        Self {
            race: RaceConfig::for_pal(),
            ..Default::default()
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.race.frame_rate;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "frame rate must be positive, got {rate}"
            )));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch size must be at least 1".into()));
        }
        Ok(())
    }
}
