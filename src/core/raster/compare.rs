use log::debug;
use serde::{Deserialize, Serialize};

use super::buffer::Raster;
use super::error::RasterError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Log every computed score.
    pub debug: bool,
}

/// Pixel-level primitives: difference score, masked AND, translation.
#[derive(Debug, Clone, Default)]
pub struct PixelCompare {
    config: CompareConfig,
}

impl PixelCompare {
    pub fn new() -> Self {
        Self::with_config(CompareConfig::default())
    }

    pub fn with_config(config: CompareConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Mean absolute sample difference scaled to `[0, 1]`.
    ///
    /// 0 means identical. The score is symmetric and independent of image
    /// size, so scores from differently sized masks can be ranked together.
    pub fn compare(&self, a: &Raster, b: &Raster) -> Result<f64, RasterError> {
        check_compatible(a, b)?;

        if a.data().is_empty() {
            return Ok(0.0);
        }

        let total: u64 = a
            .data()
            .iter()
            .zip(b.data())
            .map(|(&x, &y)| u64::from(x.abs_diff(y)))
            .sum();

        let score = total as f64 / (a.data().len() as f64 * 255.0);

        if self.config.debug {
            debug!(
                "compare {}x{}x{}: score {:.6}",
                a.width(),
                a.height(),
                a.channels(),
                score
            );
        }

        Ok(score)
    }

    /// ANDs every sample of `image` with the matching sample of `mask`, in
    /// place. Nothing is touched when the shapes differ.
    pub fn mask_and(&self, image: &mut Raster, mask: &Raster) -> Result<(), RasterError> {
        check_compatible(image, mask)?;

        for (s, &m) in image.data_mut().iter_mut().zip(mask.data()) {
            *s &= m;
        }

        Ok(())
    }

    /// Copying variant of [`PixelCompare::mask_and`].
    pub fn masked(&self, image: &Raster, mask: &Raster) -> Result<Raster, RasterError> {
        let mut out = image.clone();
        self.mask_and(&mut out, mask)?;
        Ok(out)
    }

    /// Output pixel (x, y) is input pixel (x - dx, y - dy) when that lies
    /// inside the image, black otherwise.
    pub fn translate(&self, image: &Raster, dx: i64, dy: i64) -> Raster {
        let mut out = Raster::filled(image.width(), image.height(), image.channels(), 0);

        let w = i64::from(image.width());
        let h = i64::from(image.height());
        if dx.unsigned_abs() >= w as u64 || dy.unsigned_abs() >= h as u64 {
            return out;
        }

        let channels = image.channels() as usize;
        let dst_x0 = dx.max(0);
        let dst_x1 = (w + dx).min(w);
        let span = (dst_x1 - dst_x0) as usize * channels;
        let src = image.data();
        let dst = out.data_mut();

        for y in dy.max(0)..(h + dy).min(h) {
            let sy = y - dy;
            let src_start = (sy * w + dst_x0 - dx) as usize * channels;
            let dst_start = (y * w + dst_x0) as usize * channels;
            dst[dst_start..dst_start + span].copy_from_slice(&src[src_start..src_start + span]);
        }

        out
    }
}

fn check_compatible(a: &Raster, b: &Raster) -> Result<(), RasterError> {
    if a.dimensions() != b.dimensions() {
        return Err(RasterError::DimensionMismatch {
            left: a.dimensions(),
            right: b.dimensions(),
        });
    }
    if a.channels() != b.channels() {
        return Err(RasterError::ChannelMismatch {
            left: a.channels(),
            right: b.channels(),
        });
    }
    Ok(())
}
