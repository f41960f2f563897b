use std::borrow::Cow;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::core::masks::{FieldKind, Mask, MaskSet};
use crate::core::raster::{PixelCompare, Raster, RasterError};

/// How hard to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fidelity {
    /// Every candidate at the frame's own alignment only.
    Quick,
    /// Every candidate at every alignment offset.
    Exhaustive,
}

/// Per-field acceptance thresholds. A candidate is accepted only when its
/// score is strictly below the threshold of its field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub screen: f64,
    pub track: f64,
    pub place: f64,
    pub lap: f64,
    pub character: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            screen: 0.10,
            track: 0.12,
            place: 0.10,
            lap: 0.10,
            character: 0.12,
        }
    }
}

impl Thresholds {
    pub fn for_kind(&self, kind: FieldKind) -> f64 {
        match kind {
            FieldKind::Screen => self.screen,
            FieldKind::Track => self.track,
            FieldKind::Place { .. } => self.place,
            FieldKind::Lap { .. } => self.lap,
            FieldKind::Character { .. } => self.character,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub thresholds: Thresholds,
    /// Screen modes that mean "race start".
    pub start_modes: Vec<String>,
    /// Largest pixel offset tried in each direction during exhaustive
    /// classification.
    pub alignment_jitter: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            start_modes: vec!["start".to_string()],
            alignment_jitter: 1,
        }
    }
}

/// A frame together with translated copies of it for alignment search. The
/// untranslated frame is always the first view.
pub struct AlignedFrame<'f> {
    views: Vec<Cow<'f, Raster>>,
}

impl<'f> AlignedFrame<'f> {
    pub fn new(frame: &'f Raster) -> Self {
        Self {
            views: vec![Cow::Borrowed(frame)],
        }
    }

    pub fn with_jitter(frame: &'f Raster, jitter: u32, compare: &PixelCompare) -> Self {
        let mut aligned = Self::new(frame);
        let j = i64::from(jitter);
        for dy in -j..=j {
            for dx in -j..=j {
                if dx != 0 || dy != 0 {
                    aligned
                        .views
                        .push(Cow::Owned(compare.translate(frame, dx, dy)));
                }
            }
        }
        aligned
    }

    pub fn frame(&self) -> &Raster {
        &self.views[0]
    }

    pub fn views(&self) -> impl Iterator<Item = &Raster> {
        self.views.iter().map(|v| &**v)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Classification<'a> {
    /// Best candidate, accepted.
    Match { mask: &'a Mask, score: f64 },
    /// Best candidate, but over threshold.
    Rejected { best: &'a Mask, score: f64 },
    /// No candidate applies to frames of this size.
    Incompatible,
}

impl<'a> Classification<'a> {
    pub fn accepted(&self) -> Option<(&'a Mask, f64)> {
        match *self {
            Classification::Match { mask, score } => Some((mask, score)),
            _ => None,
        }
    }
}

/// Matches frames against the mask set, one field at a time.
pub struct TemplateClassifier {
    masks: MaskSet,
    compare: PixelCompare,
    config: ClassifierConfig,
}

impl TemplateClassifier {
    pub fn new(masks: MaskSet, compare: PixelCompare, config: ClassifierConfig) -> Self {
        Self {
            masks,
            compare,
            config,
        }
    }

    pub fn masks(&self) -> &MaskSet {
        &self.masks
    }

    pub fn compare(&self) -> &PixelCompare {
        &self.compare
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Score of one frame view against one mask: the frame is cut down to
    /// the mask's region, ANDed with its stencil and compared with its
    /// template.
    pub fn score(&self, frame: &Raster, mask: &Mask) -> Result<f64, RasterError> {
        if frame.dimensions() != mask.source_size() {
            return Err(RasterError::DimensionMismatch {
                left: frame.dimensions(),
                right: mask.source_size(),
            });
        }

        let mut roi = frame.crop(mask.region())?;
        self.compare.mask_and(&mut roi, mask.stencil())?;
        self.compare.compare(&roi, mask.template())
    }

    fn best_score(&self, aligned: &AlignedFrame<'_>, mask: &Mask) -> Result<f64, RasterError> {
        let mut best = f64::INFINITY;
        for view in aligned.views() {
            best = best.min(self.score(view, mask)?);
        }
        Ok(best)
    }

    /// Picks the lowest-scoring candidate over every view of `aligned`. Ties
    /// go to the earlier candidate.
    pub fn classify<'a, I>(
        &self,
        aligned: &AlignedFrame<'_>,
        candidates: I,
        threshold: f64,
    ) -> Classification<'a>
    where
        I: IntoIterator<Item = &'a Mask>,
    {
        let mut best: Option<(&'a Mask, f64)> = None;

        for mask in candidates {
            let score = match self.best_score(aligned, mask) {
                Ok(score) => score,
                Err(e) => {
                    trace!("{}: {}", mask.name(), e);
                    continue;
                }
            };
            trace!("{}: {:.6}", mask.name(), score);

            if best.map_or(true, |(_, s)| score < s) {
                best = Some((mask, score));
            }
        }

        match best {
            None => Classification::Incompatible,
            Some((mask, score)) if score < threshold => Classification::Match { mask, score },
            Some((best, score)) => Classification::Rejected { best, score },
        }
    }

    /// Classifies `kind` against every mask of that field.
    pub fn classify_field(&self, aligned: &AlignedFrame<'_>, kind: FieldKind) -> Classification<'_> {
        self.classify(
            aligned,
            self.masks.candidates(kind),
            self.config.thresholds.for_kind(kind),
        )
    }

    pub fn align<'f>(&self, frame: &'f Raster, fidelity: Fidelity) -> AlignedFrame<'f> {
        match fidelity {
            Fidelity::Quick => AlignedFrame::new(frame),
            Fidelity::Exhaustive => {
                AlignedFrame::with_jitter(frame, self.config.alignment_jitter, &self.compare)
            }
        }
    }
}
