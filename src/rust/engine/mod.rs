pub mod audio;
pub mod chords;
pub mod host;

pub use audio::{AudioEngine, AudioError, EngineStatus, PlayOptions, PlayTarget};
