//! Play a list of chords in order with a fixed pause between them

use std::time::Duration;

use serde::Serialize;
use serde_json::json;

use crate::engine::audio::{AudioEngine, PlayOptions, PlayTarget};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordOutcome {
    pub chord: String,
    pub played: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionOutcome {
    pub chords: Vec<ChordOutcome>,
}

impl ProgressionOutcome {
    pub fn played_count(&self) -> usize {
        self.chords.iter().filter(|c| c.played).count()
    }

    pub fn all_played(&self) -> bool {
        !self.chords.is_empty() && self.chords.iter().all(|c| c.played)
    }
}

/// A chord that fails is recorded and the progression carries on. The gap
/// follows every chord except the last.
pub async fn play_progression(
    engine: &AudioEngine,
    chords: &[String],
    gap: Duration,
    options: PlayOptions,
) -> ProgressionOutcome {
    let mut outcome = ProgressionOutcome::default();

    for (index, chord) in chords.iter().enumerate() {
        let played = engine.play(&PlayTarget::Chord(chord.clone()), options).await;
        outcome.chords.push(ChordOutcome {
            chord: chord.clone(),
            played,
        });

        if index + 1 < chords.len() {
            engine.host().sleep(gap).await;
        }
    }

    engine.diagnostics().info_with(
        "PROGRESSION",
        "Progression finished",
        &json!({
            "chords": chords.len(),
            "played": outcome.played_count(),
            "gapMs": gap.as_millis() as u64,
        }),
    );
    outcome
}

#[cfg(test)]
#[path = "test_progression.rs"]
mod tests;
