pub mod progression;

pub use progression::{ChordOutcome, ProgressionOutcome, play_progression};
