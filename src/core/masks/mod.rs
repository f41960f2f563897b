//! Template masks and their on-disk repository.

pub mod error;
pub mod loader;
pub mod mask;

pub use error::MaskError;
pub use loader::{MaskLoader, MaskNameParser};
pub use mask::{FieldKind, Mask};

/// Read-only mask collection, kept in load order.
#[derive(Debug, Clone, Default)]
pub struct MaskSet {
    masks: Vec<Mask>,
}

impl MaskSet {
    pub fn new(masks: Vec<Mask>) -> Self {
        Self { masks }
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mask> {
        self.masks.iter()
    }

    /// Masks for one field, in load order.
    pub fn candidates(&self, kind: FieldKind) -> impl Iterator<Item = &Mask> {
        self.masks.iter().filter(move |m| m.kind() == kind)
    }

    /// Highest player slot any place mask refers to.
    pub fn player_slots(&self) -> u8 {
        self.masks
            .iter()
            .filter_map(|m| match m.kind() {
                FieldKind::Place { player } => Some(player),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}
