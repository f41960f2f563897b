use std::path::PathBuf;

use thiserror::Error;

use crate::core::raster::RasterError;

/// Mask repository failures. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum MaskError {
    #[error("failed to read mask directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable masks in {0:?}")]
    Empty(PathBuf),
    #[error("mask {0} has no non-black pixels")]
    Blank(String),
    #[error("invalid mask name pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error(transparent)]
    Raster(#[from] RasterError),
}
