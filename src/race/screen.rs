use std::collections::HashSet;
use std::fmt;

/// Outcome of classifying one field: the accepted value with its score, or
/// unknown when no candidate was close enough.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Unknown,
    Known { value: T, score: f64 },
}

impl<T> Field<T> {
    pub fn known(value: T, score: f64) -> Self {
        Field::Known { value, score }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Known { value, .. } => Some(value),
            Field::Unknown => None,
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            Field::Known { score, .. } => Some(*score),
            Field::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Field::Known { .. })
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Unknown
    }
}

/// Event bits derived from a classified screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ScreenEvents(u32);

impl ScreenEvents {
    pub const RACE_START: ScreenEvents = ScreenEvents(0x1);

    pub fn empty() -> Self {
        ScreenEvents(0)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: ScreenEvents) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: ScreenEvents) {
        self.0 |= other.0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// 1-based player number (screen quadrant).
    pub slot: u8,
    pub place: Field<u8>,
    pub lap: Field<u8>,
    pub character: Field<String>,
}

impl PlayerState {
    pub fn new(slot: u8, place: Field<u8>) -> Self {
        Self {
            slot,
            place,
            lap: Field::Unknown,
            character: Field::Unknown,
        }
    }
}

/// Everything recognised on one frame.
///
/// `players` is the run of player slots, from p1 upward, whose place could
/// be read; its length is the detected player count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenRecord {
    pub events: ScreenEvents,
    pub mode: Field<String>,
    pub track: Field<String>,
    pub players: Vec<PlayerState>,
}

impl ScreenRecord {
    pub fn is_race_start(&self) -> bool {
        self.events.contains(ScreenEvents::RACE_START)
    }

    /// Whether `self` can be meaningfully diffed against `previous`.
    ///
    /// Needs at least one player, every place known and no place held twice.
    /// A previous record without players (a start screen that showed none)
    /// accepts any player count; otherwise the counts must agree.
    pub fn is_comparable_to(&self, previous: &ScreenRecord) -> bool {
        if self.players.is_empty() {
            return false;
        }

        let mut seen = HashSet::new();
        for player in &self.players {
            match player.place.value() {
                Some(place) if seen.insert(*place) => {}
                _ => return false,
            }
        }

        previous.players.is_empty() || previous.players.len() == self.players.len()
    }

    /// Field-level change test on player count, places and laps. Laps only
    /// count when read on both screens. Scores, characters and track are
    /// descriptive and never trigger a change.
    pub fn differs_from(&self, previous: &ScreenRecord) -> bool {
        if self.players.len() != previous.players.len() {
            return true;
        }

        self.players.iter().zip(&previous.players).any(|(cur, prev)| {
            if cur.place.value() != prev.place.value() {
                return true;
            }
            matches!(
                (cur.lap.value(), prev.lap.value()),
                (Some(a), Some(b)) if a != b
            )
        })
    }
}

fn ordinal(n: u8) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.slot)?;
        if let Some(character) = self.character.value() {
            write!(f, " {character}")?;
        }
        match self.place.value() {
            Some(place) => write!(f, " {}", ordinal(*place))?,
            None => write!(f, " ?")?,
        }
        if let Some(lap) = self.lap.value() {
            write!(f, " lap {lap}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ScreenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_race_start() {
            write!(f, "race start, ")?;
        }
        if let Some(track) = self.track.value() {
            write!(f, "track {track}, ")?;
        }

        let n = self.players.len();
        write!(f, "{} player{}", n, if n == 1 { "" } else { "s" })?;

        for (i, player) in self.players.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{sep}{player}")?;
        }
        Ok(())
    }
}
