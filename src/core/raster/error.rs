use std::path::PathBuf;

use thiserror::Error;

use super::buffer::Region;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("image dimensions do not match: {}x{} vs {}x{}", .left.0, .left.1, .right.0, .right.1)]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },
    #[error("image channel counts do not match: {left} vs {right}")]
    ChannelMismatch { left: u8, right: u8 },
    #[error("pixel buffer holds {actual} samples, expected {expected}")]
    InvalidBuffer { expected: usize, actual: usize },
    #[error("region {region} does not fit a {width}x{height} image")]
    RegionOutOfBounds {
        region: Region,
        width: u32,
        height: u32,
    },
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u8),
    #[error("failed to read {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
