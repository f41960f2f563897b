use log::debug;

use crate::core::masks::FieldKind;
use crate::core::raster::Raster;

use super::classifier::{AlignedFrame, Classification, Fidelity, TemplateClassifier};
use super::screen::{Field, PlayerState, ScreenEvents, ScreenRecord};

/// Anything that can turn one frame into a screen record.
pub trait ScreenClassifier: Send + Sync {
    fn classify_screen(&self, frame: &Raster, fidelity: Fidelity) -> ScreenRecord;
}

/// Assembles a [`ScreenRecord`] from per-field classifications.
///
/// Stateless: the only thing read besides the frame is the immutable mask
/// set inside the classifier.
pub struct ScreenBuilder {
    classifier: TemplateClassifier,
}

impl ScreenBuilder {
    pub fn new(classifier: TemplateClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &TemplateClassifier {
        &self.classifier
    }

    pub fn build(&self, frame: &Raster, fidelity: Fidelity) -> ScreenRecord {
        let aligned = self.classifier.align(frame, fidelity);
        let text = |label: &str| Some(label.to_string());
        let number = |label: &str| label.parse::<u8>().ok();

        let mode = self.field(&aligned, FieldKind::Screen, text);
        let track = self.field(&aligned, FieldKind::Track, text);

        let mut players = Vec::new();
        for player in 1..=self.classifier.masks().player_slots() {
            let place = self.field(&aligned, FieldKind::Place { player }, number);
            if !place.is_known() {
                break;
            }
            players.push(PlayerState {
                slot: player,
                place,
                lap: self.field(&aligned, FieldKind::Lap { player }, number),
                character: self.field(&aligned, FieldKind::Character { player }, text),
            });
        }

        let mut events = ScreenEvents::empty();
        let start_modes = &self.classifier.config().start_modes;
        if mode.value().is_some_and(|m| start_modes.contains(m)) {
            events.insert(ScreenEvents::RACE_START);
        }

        ScreenRecord {
            events,
            mode,
            track,
            players,
        }
    }

    fn field<T>(
        &self,
        aligned: &AlignedFrame<'_>,
        kind: FieldKind,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Field<T> {
        match self.classifier.classify_field(aligned, kind) {
            Classification::Match { mask, score } => match parse(mask.label()) {
                Some(value) => Field::known(value, score),
                None => Field::Unknown,
            },
            Classification::Rejected { best, score } => {
                debug!("{}: best {} at {:.4} rejected", kind, best.name(), score);
                Field::Unknown
            }
            Classification::Incompatible => {
                let (w, h) = aligned.frame().dimensions();
                debug!("{}: no mask applies to a {}x{} frame", kind, w, h);
                Field::Unknown
            }
        }
    }
}

impl ScreenClassifier for ScreenBuilder {
    fn classify_screen(&self, frame: &Raster, fidelity: Fidelity) -> ScreenRecord {
        self.build(frame, fidelity)
    }
}

/// Classifier driven by a closure, for exercising the pipeline without masks.
pub struct MockScreenClassifier {
    pattern: Box<dyn Fn(&Raster, Fidelity) -> ScreenRecord + Send + Sync>,
}

impl MockScreenClassifier {
    pub fn with_pattern<F>(pattern: F) -> Self
    where
        F: Fn(&Raster, Fidelity) -> ScreenRecord + Send + Sync + 'static,
    {
        Self {
            pattern: Box::new(pattern),
        }
    }
}

impl ScreenClassifier for MockScreenClassifier {
    fn classify_screen(&self, frame: &Raster, fidelity: Fidelity) -> ScreenRecord {
        (self.pattern)(frame, fidelity)
    }
}
