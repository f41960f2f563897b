//! Mask repository: loads every mask in one directory, once, at startup.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use regex::Regex;

use crate::core::raster::codec;

use super::error::MaskError;
use super::mask::{FieldKind, Mask};
use super::MaskSet;

const MASK_NAME_PATTERN: &str = concat!(
    r"^(?:screen_(?P<screen>[a-z0-9_]+)",
    r"|track_(?P<track>[a-z0-9_]+)",
    r"|pos(?P<place>[1-9])_p(?P<place_player>[1-4])",
    r"|lap(?P<lap>[1-9])_p(?P<lap_player>[1-4])",
    r"|char_(?P<character>[a-z0-9]+)_p(?P<character_player>[1-4]))$",
);

/// Maps a mask file stem to the field it classifies and the value it stands
/// for, e.g. `pos2_p1` -> (p1 place, "2").
pub struct MaskNameParser {
    pattern: Regex,
}

impl MaskNameParser {
    pub fn new() -> Result<Self, MaskError> {
        Ok(Self {
            pattern: Regex::new(MASK_NAME_PATTERN)?,
        })
    }

    pub fn parse(&self, stem: &str) -> Option<(FieldKind, String)> {
        let stem = stem.to_lowercase();
        let caps = self.pattern.captures(&stem)?;
        let player = |group: &str| caps.name(group).and_then(|m| m.as_str().parse::<u8>().ok());

        if let Some(m) = caps.name("screen") {
            return Some((FieldKind::Screen, m.as_str().to_string()));
        }
        if let Some(m) = caps.name("track") {
            return Some((FieldKind::Track, m.as_str().to_string()));
        }
        if let (Some(m), Some(player)) = (caps.name("place"), player("place_player")) {
            return Some((FieldKind::Place { player }, m.as_str().to_string()));
        }
        if let (Some(m), Some(player)) = (caps.name("lap"), player("lap_player")) {
            return Some((FieldKind::Lap { player }, m.as_str().to_string()));
        }
        if let (Some(m), Some(player)) = (caps.name("character"), player("character_player")) {
            return Some((FieldKind::Character { player }, m.as_str().to_string()));
        }

        None
    }
}

pub struct MaskLoader {
    dir: PathBuf,
    supported_extensions: Vec<String>,
}

impl MaskLoader {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            supported_extensions: vec![
                "png".to_string(),
                "ppm".to_string(),
                "bmp".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
            ],
        }
    }

    /// Loads all recognised masks, ordered by file name. The order is the
    /// candidate order used for tie-breaks during classification.
    pub fn load(&self) -> Result<MaskSet, MaskError> {
        let parser = MaskNameParser::new()?;
        let io_err = |source: std::io::Error| MaskError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let supported = path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| self.supported_extensions.contains(&ext));
            if supported {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut masks = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            let Some((kind, label)) = parser.parse(&stem) else {
                warn!("skipping unrecognised mask {:?}", path);
                continue;
            };

            let raster = codec::decode(&path)?;
            let mask = Mask::new(stem, kind, label, &raster)?;
            debug!("mask {} -> {} in {}", mask.name(), kind, mask.region());
            masks.push(mask);
        }

        if masks.is_empty() {
            return Err(MaskError::Empty(self.dir.clone()));
        }

        info!("loaded {} masks from {:?}", masks.len(), self.dir);
        Ok(MaskSet::new(masks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::{encode, Raster};

    #[test]
    fn test_parse_mask_names() {
        let parser = MaskNameParser::new().unwrap();

        assert_eq!(
            parser.parse("screen_start"),
            Some((FieldKind::Screen, "start".to_string()))
        );
        assert_eq!(
            parser.parse("track_luigi_raceway"),
            Some((FieldKind::Track, "luigi_raceway".to_string()))
        );
        assert_eq!(
            parser.parse("pos3_p2"),
            Some((FieldKind::Place { player: 2 }, "3".to_string()))
        );
        assert_eq!(
            parser.parse("LAP2_P4"),
            Some((FieldKind::Lap { player: 4 }, "2".to_string()))
        );
        assert_eq!(
            parser.parse("char_yoshi_p1"),
            Some((FieldKind::Character { player: 1 }, "yoshi".to_string()))
        );
        assert_eq!(parser.parse("pos1_p5"), None);
        assert_eq!(parser.parse("notes"), None);
    }

    fn spot(x: u32, y: u32) -> Raster {
        let mut raster = Raster::filled(16, 16, 3, 0);
        raster.pixel_mut(x, y).copy_from_slice(&[255, 255, 255]);
        raster
    }

    #[test]
    fn test_load_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        encode(&spot(1, 1), dir.path().join("pos2_p1.png")).unwrap();
        encode(&spot(1, 1), dir.path().join("pos1_p1.png")).unwrap();
        encode(&spot(5, 5), dir.path().join("screen_start.png")).unwrap();
        encode(&spot(5, 5), dir.path().join("readme.png")).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a mask").unwrap();

        let masks = MaskLoader::new(dir.path()).load().unwrap();
        let names: Vec<_> = masks.iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, vec!["pos1_p1", "pos2_p1", "screen_start"]);
        assert_eq!(masks.player_slots(), 1);
    }

    #[test]
    fn test_empty_directory_is_init_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MaskLoader::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, MaskError::Empty(_)));
    }

    #[test]
    fn test_missing_directory_is_init_error() {
        let err = MaskLoader::new("/nonexistent/kartvid/masks").load().unwrap_err();
        assert!(matches!(err, MaskError::Io { .. }));
    }
}
