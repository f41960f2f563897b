use std::path::PathBuf;

use log::{info, warn};
use rayon::prelude::*;

use crate::core::raster::{codec, Raster, RasterError};

use super::builder::ScreenClassifier;
use super::classifier::Fidelity;
use super::config::PipelineConfig;
use super::screen::ScreenRecord;
use super::state_machine::{RaceEvent, RaceStateMachine};

/// An ordered, randomly accessible sequence of frames.
pub trait FrameSource: Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name printed with events for frame `index`.
    fn frame_id(&self, index: usize) -> String;

    fn load(&self, index: usize) -> Result<Raster, RasterError>;
}

/// A video given as one image file per frame.
pub struct FileFrames {
    paths: Vec<PathBuf>,
}

impl FileFrames {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl FrameSource for FileFrames {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn frame_id(&self, index: usize) -> String {
        self.paths[index].display().to_string()
    }

    fn load(&self, index: usize) -> Result<Raster, RasterError> {
        codec::decode(&self.paths[index])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoStats {
    pub frames: usize,
    pub classified: usize,
    pub unreadable: usize,
    pub debounced: usize,
    pub events: usize,
}

/// Runs one video through classification and the race state machine.
pub struct VideoProcessor<'c> {
    classifier: &'c dyn ScreenClassifier,
    state_machine: RaceStateMachine,
    config: PipelineConfig,
    stats: VideoStats,
}

impl<'c> VideoProcessor<'c> {
    pub fn new(classifier: &'c dyn ScreenClassifier, config: PipelineConfig) -> Self {
        Self {
            classifier,
            state_machine: RaceStateMachine::with_config(config.race.clone()),
            config,
            stats: VideoStats::default(),
        }
    }

    pub fn stats(&self) -> &VideoStats {
        &self.stats
    }

    /// Processes every frame of `source` in order, handing each event to
    /// `on_event` as soon as it is decided. Unreadable frames are logged and
    /// skipped.
    pub fn run<S, F>(&mut self, source: &S, mut on_event: F) -> VideoStats
    where
        S: FrameSource,
        F: FnMut(&RaceEvent),
    {
        if self.config.parallel {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.workers)
                .build()
            {
                Ok(pool) => self.run_parallel(source, &pool, &mut on_event),
                Err(e) => {
                    warn!("falling back to sequential processing: {}", e);
                    self.run_sequential(source, &mut on_event);
                }
            }
        } else {
            self.run_sequential(source, &mut on_event);
        }

        info!(
            "{} frames: {} classified, {} debounced, {} unreadable, {} events",
            self.stats.frames,
            self.stats.classified,
            self.stats.debounced,
            self.stats.unreadable,
            self.stats.events
        );
        self.stats.clone()
    }

    /// Collects all events instead of streaming them.
    pub fn process_all<S: FrameSource>(&mut self, source: &S) -> Vec<RaceEvent> {
        let mut events = Vec::new();
        self.run(source, |e| events.push(e.clone()));
        events
    }

    fn run_sequential<S, F>(&mut self, source: &S, on_event: &mut F)
    where
        S: FrameSource,
        F: FnMut(&RaceEvent),
    {
        for index in 0..source.len() {
            self.stats.frames += 1;
            if self.state_machine.is_debounced(index) {
                self.stats.debounced += 1;
                continue;
            }

            let frame = match source.load(index) {
                Ok(frame) => frame,
                Err(e) => {
                    self.unreadable(source, index, &e);
                    continue;
                }
            };

            self.stats.classified += 1;
            let id = source.frame_id(index);
            if let Some(event) =
                self.state_machine
                    .process_frame(index, &id, &frame, self.classifier)
            {
                self.stats.events += 1;
                on_event(&event);
            }
        }
    }

    /// Classifies a batch of frames on `pool`, then replays the results
    /// through the state machine in frame order. Start frames are reloaded
    /// for the exhaustive pass rather than kept in memory.
    fn run_parallel<S, F>(&mut self, source: &S, pool: &rayon::ThreadPool, on_event: &mut F)
    where
        S: FrameSource,
        F: FnMut(&RaceEvent),
    {
        let classifier = self.classifier;
        let len = source.len();
        let batch = self.config.batch_size.max(1);

        for batch_start in (0..len).step_by(batch) {
            let range = batch_start..(batch_start + batch).min(len);
            let results: Vec<(usize, Result<ScreenRecord, RasterError>)> = pool.install(|| {
                range
                    .into_par_iter()
                    .map(|index| {
                        let screen = source
                            .load(index)
                            .map(|frame| classifier.classify_screen(&frame, Fidelity::Quick));
                        (index, screen)
                    })
                    .collect()
            });

            for (index, result) in results {
                self.stats.frames += 1;
                if self.state_machine.is_debounced(index) {
                    self.stats.debounced += 1;
                    continue;
                }

                let screen = match result {
                    Ok(screen) => screen,
                    Err(e) => {
                        self.unreadable(source, index, &e);
                        continue;
                    }
                };

                self.stats.classified += 1;
                let id = source.frame_id(index);
                let rescan = || match source.load(index) {
                    Ok(frame) => Some(classifier.classify_screen(&frame, Fidelity::Exhaustive)),
                    Err(e) => {
                        warn!("failed to re-read {}: {}", id, e);
                        None
                    }
                };

                if let Some(event) = self.state_machine.observe(index, &id, screen, rescan) {
                    self.stats.events += 1;
                    on_event(&event);
                }
            }
        }
    }

    fn unreadable<S: FrameSource>(&mut self, source: &S, index: usize, err: &RasterError) {
        warn!("failed to read {}: {}", source.frame_id(index), err);
        self.stats.unreadable += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::builder::MockScreenClassifier;
    use crate::race::screen::{Field, PlayerState, ScreenEvents};
    use crate::race::state_machine::{EventKind, RaceConfig};

    /// Frames are 1x1; the red sample selects the screen: 1 = start,
    /// 2 = p1 leads, 3 = p2 leads. `None` frames fail to load.
    struct MemoryFrames {
        frames: Vec<Option<u8>>,
    }

    impl FrameSource for MemoryFrames {
        fn len(&self) -> usize {
            self.frames.len()
        }

        fn frame_id(&self, index: usize) -> String {
            format!("mem/{index:05}.png")
        }

        fn load(&self, index: usize) -> Result<Raster, RasterError> {
            match self.frames[index] {
                Some(code) => Raster::new(1, 1, 3, vec![code, 0, 0]),
                None => Err(RasterError::InvalidBuffer {
                    expected: 3,
                    actual: 0,
                }),
            }
        }
    }

    fn classifier() -> MockScreenClassifier {
        MockScreenClassifier::with_pattern(|frame, fidelity| {
            let places: &[u8] = match frame.data()[0] {
                3 => &[2, 1],
                _ => &[1, 2],
            };
            let mut record = ScreenRecord {
                players: places
                    .iter()
                    .enumerate()
                    .map(|(i, &p)| PlayerState::new(i as u8 + 1, Field::known(p, 0.0)))
                    .collect(),
                ..Default::default()
            };
            if frame.data()[0] == 1 {
                record.events.insert(ScreenEvents::RACE_START);
                if fidelity == Fidelity::Exhaustive {
                    record.track = Field::known("royal_raceway".to_string(), 0.0);
                }
            }
            record
        })
    }

    fn config(parallel: bool) -> PipelineConfig {
        PipelineConfig {
            race: RaceConfig {
                frame_rate: 30.0,
                min_race_frames: 20,
                debug: false,
            },
            parallel,
            workers: 3,
            batch_size: 7,
            ..Default::default()
        }
    }

    fn video() -> MemoryFrames {
        let mut frames = vec![Some(2u8); 120];
        frames[5] = Some(3);
        frames[10] = Some(1);
        frames[11] = Some(1);
        frames[12] = None;
        frames[40] = None;
        for f in frames.iter_mut().skip(60) {
            *f = Some(3);
        }
        MemoryFrames { frames }
    }

    #[test]
    fn test_sequential_pipeline() {
        let classifier = classifier();
        let mut processor = VideoProcessor::new(&classifier, config(false));

        let events = processor.process_all(&video());
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].kind, EventKind::RaceStart);
        assert_eq!(events[0].frame_index, 10);
        assert_eq!(events[0].frame_id, "mem/00010.png");
        assert!(events[0].screen.track.is_known());

        assert_eq!(events[1].kind, EventKind::Transition);
        assert_eq!(events[1].frame_index, 60);
        assert_eq!(events[1].to_string(), "mem/00060.png (time 0m:02s): 2 players: p1 2nd, p2 1st");

        let stats = processor.stats();
        assert_eq!(stats.frames, 120);
        assert_eq!(stats.debounced, 19);
        assert_eq!(stats.unreadable, 1);
        assert_eq!(stats.events, 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let classifier = classifier();
        let sequential = VideoProcessor::new(&classifier, config(false)).process_all(&video());
        let parallel = VideoProcessor::new(&classifier, config(true)).process_all(&video());

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_unreadable_frames_do_not_disturb_state() {
        let classifier = classifier();
        let frames = MemoryFrames {
            frames: vec![Some(1), None, None, Some(3)],
        };
        let mut processor = VideoProcessor::new(
            &classifier,
            PipelineConfig {
                race: RaceConfig {
                    min_race_frames: 1,
                    ..RaceConfig::default()
                },
                ..Default::default()
            },
        );

        let events = processor.process_all(&frames);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].frame_index, 3);
        assert_eq!(processor.stats().unreadable, 2);
    }
}
