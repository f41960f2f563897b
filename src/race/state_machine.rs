use std::fmt;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::raster::Raster;

use super::builder::ScreenClassifier;
use super::classifier::Fidelity;
use super::screen::ScreenRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Frames per second of the source video; converts frame indices to
    /// timestamps.
    pub frame_rate: f64,
    /// Frames ignored after an accepted race start.
    pub min_race_frames: usize,
    /// Log why each frame was discarded.
    pub debug: bool,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self::for_ntsc()
    }
}

impl RaceConfig {
    pub fn for_ntsc() -> Self {
        Self {
            frame_rate: 29.97,
            min_race_frames: 150,
            debug: false,
        }
    }

    pub fn for_pal() -> Self {
        Self {
            frame_rate: 25.0,
            min_race_frames: 125,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceState {
    AwaitingStart,
    InRace { last_start: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    RaceStart,
    Transition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RaceEvent {
    pub kind: EventKind,
    pub frame_index: usize,
    pub frame_id: String,
    pub elapsed: Duration,
    pub screen: ScreenRecord,
}

impl fmt::Display for RaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.elapsed.as_secs();
        write!(
            f,
            "{} (time {}m:{:02}s): {}",
            self.frame_id,
            secs / 60,
            secs % 60,
            self.screen
        )
    }
}

/// Why a frame produced no event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discard {
    Debounced,
    BeforeStart,
    Incomparable,
    Unchanged,
}

/// Turns an ordered stream of screen records into race events.
///
/// Owns the per-video state (last accepted start, last accepted screen), so
/// one instance handles one video and frames must arrive in index order.
pub struct RaceStateMachine {
    state: RaceState,
    previous: Option<ScreenRecord>,
    config: RaceConfig,
}

impl RaceStateMachine {
    pub fn new() -> Self {
        Self::with_config(RaceConfig::default())
    }

    pub fn with_config(config: RaceConfig) -> Self {
        Self {
            state: RaceState::AwaitingStart,
            previous: None,
            config,
        }
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    /// True while `index` is inside the quiet window after the last start.
    /// Callers may skip decoding such frames entirely.
    pub fn is_debounced(&self, index: usize) -> bool {
        match self.state {
            RaceState::InRace { last_start } => index
                .checked_sub(last_start)
                .is_some_and(|d| d < self.config.min_race_frames),
            RaceState::AwaitingStart => false,
        }
    }

    pub fn timestamp(&self, index: usize) -> Duration {
        let rate = self.config.frame_rate;
        if rate.is_finite() && rate > 0.0 {
            Duration::from_secs_f64(index as f64 / rate)
        } else {
            Duration::ZERO
        }
    }

    /// Feeds the quick classification of frame `index`.
    ///
    /// `rescan` is called only for race-start frames and should return a
    /// more careful classification of the same frame; `None` keeps `screen`.
    pub fn observe<F>(
        &mut self,
        index: usize,
        frame_id: &str,
        screen: ScreenRecord,
        rescan: F,
    ) -> Option<RaceEvent>
    where
        F: FnOnce() -> Option<ScreenRecord>,
    {
        if self.is_debounced(index) {
            return self.discard(index, Discard::Debounced);
        }

        if screen.is_race_start() {
            let snapshot = rescan().unwrap_or(screen);
            self.state = RaceState::InRace { last_start: index };
            self.previous = Some(snapshot.clone());
            return Some(self.event(EventKind::RaceStart, index, frame_id, snapshot));
        }

        let Some(previous) = &self.previous else {
            return self.discard(index, Discard::BeforeStart);
        };

        if !screen.is_comparable_to(previous) {
            return self.discard(index, Discard::Incomparable);
        }

        if !screen.differs_from(previous) {
            return self.discard(index, Discard::Unchanged);
        }

        self.previous = Some(screen.clone());
        Some(self.event(EventKind::Transition, index, frame_id, screen))
    }

    /// Classifies `frame` quickly and feeds the result, re-running the
    /// classifier exhaustively when the frame is a race start.
    pub fn process_frame(
        &mut self,
        index: usize,
        frame_id: &str,
        frame: &Raster,
        classifier: &dyn ScreenClassifier,
    ) -> Option<RaceEvent> {
        if self.is_debounced(index) {
            return self.discard(index, Discard::Debounced);
        }

        let screen = classifier.classify_screen(frame, Fidelity::Quick);
        self.observe(index, frame_id, screen, || {
            Some(classifier.classify_screen(frame, Fidelity::Exhaustive))
        })
    }

    fn event(
        &self,
        kind: EventKind,
        index: usize,
        frame_id: &str,
        screen: ScreenRecord,
    ) -> RaceEvent {
        RaceEvent {
            kind,
            frame_index: index,
            frame_id: frame_id.to_string(),
            elapsed: self.timestamp(index),
            screen,
        }
    }

    fn discard(&self, index: usize, reason: Discard) -> Option<RaceEvent> {
        if self.config.debug {
            debug!("frame {}: discarded ({:?})", index, reason);
        }
        None
    }

    pub fn current_state(&self) -> RaceState {
        self.state
    }

    pub fn previous_screen(&self) -> Option<&ScreenRecord> {
        self.previous.as_ref()
    }

    pub fn reset(&mut self) {
        self.state = RaceState::AwaitingStart;
        self.previous = None;
    }
}

impl Default for RaceStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::screen::{Field, PlayerState, ScreenEvents};

    const MIN: usize = 10;

    fn config() -> RaceConfig {
        RaceConfig {
            frame_rate: 30.0,
            min_race_frames: MIN,
            debug: true,
        }
    }

    fn screen(places: &[u8]) -> ScreenRecord {
        ScreenRecord {
            players: places
                .iter()
                .enumerate()
                .map(|(i, &p)| PlayerState::new(i as u8 + 1, Field::known(p, 0.02)))
                .collect(),
            ..Default::default()
        }
    }

    fn start(places: &[u8]) -> ScreenRecord {
        let mut s = screen(places);
        s.events.insert(ScreenEvents::RACE_START);
        s
    }

    fn run(sm: &mut RaceStateMachine, frames: &[ScreenRecord]) -> Vec<RaceEvent> {
        frames
            .iter()
            .enumerate()
            .filter_map(|(i, s)| sm.observe(i, &format!("frame{i}"), s.clone(), || None))
            .collect()
    }

    #[test]
    fn test_single_start_then_nothing() {
        let mut sm = RaceStateMachine::with_config(config());
        let k = 7;
        let mut frames = vec![screen(&[1, 2]); 100];
        frames[k] = start(&[1, 2]);
        // start screen lingers: these would be duplicate starts
        frames[k + 1] = start(&[1, 2]);
        frames[k + 3] = start(&[1, 2]);

        let events = run(&mut sm, &frames);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::RaceStart);
        assert_eq!(events[0].frame_index, k);
        assert_eq!(sm.current_state(), RaceState::InRace { last_start: k });
    }

    #[test]
    fn test_start_then_one_change() {
        let mut sm = RaceStateMachine::with_config(config());
        let k = 30;
        let change = k + MIN + 5;
        let mut frames = vec![screen(&[1, 2]); 200];
        frames[k] = start(&[1, 2]);
        for f in frames.iter_mut().skip(change) {
            *f = screen(&[2, 1]);
        }

        let events = run(&mut sm, &frames);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::RaceStart);
        assert_eq!(events[0].elapsed, Duration::from_secs(1));
        assert_eq!(events[1].kind, EventKind::Transition);
        assert_eq!(events[1].frame_index, change);
        assert_eq!(events[1].elapsed, Duration::from_secs_f64(change as f64 / 30.0));
        assert_eq!(events[1].screen, screen(&[2, 1]));
    }

    #[test]
    fn test_no_start_no_events() {
        let mut sm = RaceStateMachine::with_config(config());
        let frames: Vec<_> = (0..100)
            .map(|i| if i % 2 == 0 { screen(&[1, 2]) } else { screen(&[2, 1]) })
            .collect();

        assert!(run(&mut sm, &frames).is_empty());
        assert_eq!(sm.current_state(), RaceState::AwaitingStart);
        assert!(sm.previous_screen().is_none());
    }

    #[test]
    fn test_equal_records_never_repeat() {
        let mut sm = RaceStateMachine::with_config(config());
        let mut frames = vec![start(&[1, 2])];
        frames.extend(std::iter::repeat(screen(&[1, 2])).take(MIN));
        frames.push(screen(&[2, 1]));
        // same fields, different scores (rendering noise)
        let mut noisy = screen(&[2, 1]);
        noisy.players[0].place = Field::known(2, 0.08);
        frames.push(noisy);
        frames.push(screen(&[2, 1]));

        let events = run(&mut sm, &frames);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].frame_index, MIN + 1);
    }

    #[test]
    fn test_invalid_screens_filtered() {
        let mut sm = RaceStateMachine::with_config(config());
        let mut frames = vec![start(&[1, 2])];
        frames.extend(std::iter::repeat(screen(&[1, 2])).take(MIN));
        frames.push(screen(&[1]));
        frames.push(screen(&[1, 1]));
        frames.push(screen(&[]));
        frames.push(screen(&[2, 1]));

        let events = run(&mut sm, &frames);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].frame_index, MIN + 4);
    }

    #[test]
    fn test_rescan_replaces_start_snapshot() {
        let mut sm = RaceStateMachine::with_config(config());
        let mut refined = start(&[1, 2]);
        refined.track = Field::known("moo_moo_farm".to_string(), 0.01);

        let event = sm
            .observe(0, "f0", start(&[1, 2]), || Some(refined.clone()))
            .unwrap();
        assert_eq!(event.screen, refined);
        assert_eq!(sm.previous_screen(), Some(&refined));
    }

    #[test]
    fn test_second_start_after_window() {
        let mut sm = RaceStateMachine::with_config(config());
        let mut frames = vec![screen(&[1, 2]); 40];
        frames[0] = start(&[1, 2]);
        frames[MIN] = start(&[1, 2]);
        frames[MIN * 3] = start(&[1, 2]);

        let events = run(&mut sm, &frames);
        let starts: Vec<_> = events.iter().map(|e| e.frame_index).collect();
        assert_eq!(starts, vec![0, MIN, MIN * 3]);
    }

    #[test]
    fn test_event_display() {
        let event = RaceEvent {
            kind: EventKind::Transition,
            frame_index: 2700,
            frame_id: "frames/2700.png".to_string(),
            elapsed: Duration::from_secs_f64(2700.0 / 29.97),
            screen: screen(&[2, 1]),
        };
        assert_eq!(
            event.to_string(),
            "frames/2700.png (time 1m:30s): 2 players: p1 2nd, p2 1st"
        );
    }

    #[test]
    fn test_reset() {
        let mut sm = RaceStateMachine::with_config(config());
        sm.observe(0, "f0", start(&[1]), || None);
        assert!(sm.is_debounced(1));

        sm.reset();
        assert_eq!(sm.current_state(), RaceState::AwaitingStart);
        assert!(sm.previous_screen().is_none());
        assert!(!sm.is_debounced(1));
    }
}
