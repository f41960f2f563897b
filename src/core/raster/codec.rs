use std::path::Path;

use image::ColorType;
use log::debug;

use super::buffer::Raster;
use super::error::RasterError;

/// Decodes any format the `image` crate recognises into a 3-channel raster.
pub fn decode<P: AsRef<Path>>(path: P) -> Result<Raster, RasterError> {
    let path = path.as_ref();
    let rgb = image::open(path)
        .map_err(|source| RasterError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();

    let (width, height) = rgb.dimensions();
    debug!("decoded {:?}: {}x{}", path, width, height);
    Raster::new(width, height, 3, rgb.into_raw())
}

/// Writes `raster` with the format implied by the file extension (`.ppm`
/// gives a binary pixmap).
pub fn encode<P: AsRef<Path>>(raster: &Raster, path: P) -> Result<(), RasterError> {
    let path = path.as_ref();
    let color = match raster.channels() {
        1 => ColorType::L8,
        3 => ColorType::Rgb8,
        4 => ColorType::Rgba8,
        other => return Err(RasterError::UnsupportedChannels(other)),
    };

    image::save_buffer(path, raster.data(), raster.width(), raster.height(), color).map_err(
        |source| RasterError::Encode {
            path: path.to_path_buf(),
            source,
        },
    )
}
