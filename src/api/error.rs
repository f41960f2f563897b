use thiserror::Error;

use crate::core::masks::MaskError;
use crate::core::raster::RasterError;
use crate::race::ConfigError;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("usage: {0}")]
    Usage(String),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("failed to initialize masks: {0}")]
    Mask(#[from] MaskError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KvError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            KvError::Usage(_) => 2,
            _ => 1,
        }
    }
}
