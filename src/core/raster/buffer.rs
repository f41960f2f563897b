use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::RasterError;

/// Decoded image: row-major samples, `channels` bytes per pixel.
///
/// `data.len() == width * height * channels` always holds. The only ways to
/// change pixels in place are [`Raster::data_mut`] and the masked AND in the
/// compare engine, neither of which can change the buffer length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

/// Sub-rectangle of a raster, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn fits(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

impl Raster {
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self, RasterError> {
        if channels == 0 {
            return Err(RasterError::UnsupportedChannels(channels));
        }

        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(RasterError::InvalidBuffer {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Raster with every sample set to `value`. A zero channel count is
    /// treated as one.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Self {
        let channels = channels.max(1);
        Self {
            width,
            height,
            channels,
            data: vec![value; width as usize * height as usize * channels as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Samples of the pixel at (x, y). Panics when out of bounds, like slice
    /// indexing.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let start = self.offset(x, y);
        &self.data[start..start + self.channels as usize]
    }

    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let start = self.offset(x, y);
        let channels = self.channels as usize;
        &mut self.data[start..start + channels]
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} raster",
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }

    pub fn crop(&self, region: &Region) -> Result<Raster, RasterError> {
        if !region.fits(self.width, self.height) {
            return Err(RasterError::RegionOutOfBounds {
                region: *region,
                width: self.width,
                height: self.height,
            });
        }

        let channels = self.channels as usize;
        let row_len = region.width as usize * channels;
        let mut data = Vec::with_capacity(row_len * region.height as usize);

        for y in region.y..region.y + region.height {
            let start = (y as usize * self.width as usize + region.x as usize) * channels;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }

        Ok(Raster {
            width: region.width,
            height: region.height,
            channels: self.channels,
            data,
        })
    }

    /// Smallest region containing every pixel with a non-zero sample, or
    /// `None` for an all-black raster.
    pub fn bounding_box(&self) -> Option<Region> {
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut found = false;

        for (i, px) in self.data.chunks_exact(self.channels as usize).enumerate() {
            if px.iter().all(|&s| s == 0) {
                continue;
            }
            let x = (i % self.width as usize) as u32;
            let y = (i / self.width as usize) as u32;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            found = true;
        }

        found.then(|| Region::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Same-sized raster whose pixels are all-ones where this raster has any
    /// non-zero sample and all-zeros elsewhere.
    pub fn stencil(&self) -> Raster {
        let channels = self.channels as usize;
        let mut data = Vec::with_capacity(self.data.len());

        for px in self.data.chunks_exact(channels) {
            let fill = if px.iter().any(|&s| s != 0) { 0xff } else { 0 };
            data.extend(std::iter::repeat(fill).take(channels));
        }

        Raster {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data,
        }
    }
}
