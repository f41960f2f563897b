//! Race event detection from screen captures.
//!
//! Data flow:
//! 1. Template classification - each field is matched against its masks
//! 2. Screen building - per-field results become one `ScreenRecord`
//! 3. State machine - debounced start detection and change filtering

pub mod builder;
pub mod classifier;
pub mod config;
pub mod pipeline;
pub mod screen;
pub mod state_machine;

pub use builder::{MockScreenClassifier, ScreenBuilder, ScreenClassifier};
pub use classifier::{
    AlignedFrame, Classification, ClassifierConfig, Fidelity, TemplateClassifier, Thresholds,
};
pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{FileFrames, FrameSource, VideoProcessor, VideoStats};
pub use screen::{Field, PlayerState, ScreenEvents, ScreenRecord};
pub use state_machine::{EventKind, RaceConfig, RaceEvent, RaceState, RaceStateMachine};
