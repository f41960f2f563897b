//! Raster buffers and the pixel primitives everything else is built on.

pub mod buffer;
pub mod codec;
pub mod compare;
pub mod error;

pub use buffer::{Raster, Region};
pub use codec::{decode, encode};
pub use compare::{CompareConfig, PixelCompare};
pub use error::RasterError;
