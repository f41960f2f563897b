use std::fmt;

use crate::core::raster::{Raster, Region};

use super::error::MaskError;

/// The screen attribute a mask helps classify. Player slots are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    Screen,
    Track,
    Place { player: u8 },
    Lap { player: u8 },
    Character { player: u8 },
}

impl FieldKind {
    pub fn player(&self) -> Option<u8> {
        match self {
            FieldKind::Place { player }
            | FieldKind::Lap { player }
            | FieldKind::Character { player } => Some(*player),
            FieldKind::Screen | FieldKind::Track => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Screen => write!(f, "screen"),
            FieldKind::Track => write!(f, "track"),
            FieldKind::Place { player } => write!(f, "p{player} place"),
            FieldKind::Lap { player } => write!(f, "p{player} lap"),
            FieldKind::Character { player } => write!(f, "p{player} character"),
        }
    }
}

/// A reference image for one value of one field.
///
/// Masks are full-frame captures that are black everywhere except the part
/// of the screen they describe. That part becomes the mask's region; the
/// template and stencil are stored pre-cropped to it.
#[derive(Debug, Clone)]
pub struct Mask {
    name: String,
    kind: FieldKind,
    label: String,
    source_size: (u32, u32),
    region: Region,
    template: Raster,
    stencil: Raster,
}

impl Mask {
    pub fn new(
        name: impl Into<String>,
        kind: FieldKind,
        label: impl Into<String>,
        raster: &Raster,
    ) -> Result<Self, MaskError> {
        let name = name.into();
        let region = raster
            .bounding_box()
            .ok_or_else(|| MaskError::Blank(name.clone()))?;
        let template = raster.crop(&region)?;
        let stencil = template.stencil();

        Ok(Self {
            name,
            kind,
            label: label.into(),
            source_size: raster.dimensions(),
            region,
            template,
            stencil,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Value this mask stands for: a mode, track or character name, or a
    /// place/lap number in decimal.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Dimensions of the frames this mask applies to.
    pub fn source_size(&self) -> (u32, u32) {
        self.source_size
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn template(&self) -> &Raster {
        &self.template
    }

    pub fn stencil(&self) -> &Raster {
        &self.stencil
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_region_from_content() {
        let mut raster = Raster::filled(20, 10, 3, 0);
        for x in 4..8 {
            raster.pixel_mut(x, 3).copy_from_slice(&[255, 255, 0]);
        }

        let mask = Mask::new("pos1_p1", FieldKind::Place { player: 1 }, "1", &raster).unwrap();
        assert_eq!(*mask.region(), Region::new(4, 3, 4, 1));
        assert_eq!(mask.template().dimensions(), (4, 1));
        assert_eq!(mask.stencil().data(), &[0xff; 12]);
        assert_eq!(mask.source_size(), (20, 10));
    }

    #[test]
    fn test_blank_mask_rejected() {
        let raster = Raster::filled(8, 8, 3, 0);
        let err = Mask::new("track_x", FieldKind::Track, "x", &raster).unwrap_err();
        assert!(matches!(err, MaskError::Blank(name) if name == "track_x"));
    }
}
