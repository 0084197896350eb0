//! Chord names and fretboard fingerings
//!
//! `ChordName::parse("F#m7")` gives a root pitch class plus a quality; the
//! quality expands to intervals above the root.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::engine::audio::error::{AudioError, AudioResult};
use crate::engine::audio::frequency::{entry_for_midi, midi_to_frequency};

pub mod fretboard;

pub use fretboard::{FretPosition, STANDARD_TUNING, positions_to_notes};

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

static CHORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Ga-g])([#b]?)\s*(.*?)\s*$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
    Dominant7,
    Major7,
    Minor7,
}

impl ChordQuality {
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
        }
    }

    /// `M7` and `m7` differ only by case, so those two are matched first
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let compact: String = suffix.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            "M7" | "Δ7" => return Some(ChordQuality::Major7),
            "M" => return Some(ChordQuality::Major),
            "m" | "-" => return Some(ChordQuality::Minor),
            "m7" | "-7" => return Some(ChordQuality::Minor7),
            _ => {}
        }

        let quality = match compact.to_lowercase().as_str() {
            "" | "major" | "maj" => ChordQuality::Major,
            "minor" | "min" => ChordQuality::Minor,
            "diminished" | "dim" | "°" => ChordQuality::Diminished,
            "augmented" | "aug" | "+" => ChordQuality::Augmented,
            "sus2" => ChordQuality::Sus2,
            "sus4" | "sus" => ChordQuality::Sus4,
            "7" | "dom7" | "dominant7" => ChordQuality::Dominant7,
            "maj7" | "major7" => ChordQuality::Major7,
            "min7" | "minor7" => ChordQuality::Minor7,
            _ => return None,
        };
        Some(quality)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordName {
    /// Root as written, normalized to an uppercase letter ("F#", "Bb")
    pub root: String,
    pub pitch_class: u8,
    pub quality: ChordQuality,
    /// Set when the suffix was not recognized and the major triad was assumed
    pub assumed_major: bool,
}

impl ChordName {
    pub fn parse(name: &str) -> AudioResult<Self> {
        let captures = CHORD_PATTERN
            .captures(name)
            .ok_or_else(|| AudioError::InvalidChordInput(format!("unrecognized chord {name:?}")))?;

        let letter = captures[1].to_ascii_uppercase();
        let accidental = &captures[2];
        let suffix = &captures[3];

        let base: i32 = match letter.as_str() {
            "C" => 0,
            "D" => 2,
            "E" => 4,
            "F" => 5,
            "G" => 7,
            "A" => 9,
            _ => 11,
        };
        let offset = match accidental {
            "#" => 1,
            "b" => -1,
            _ => 0,
        };

        let (quality, assumed_major) = match ChordQuality::from_suffix(suffix) {
            Some(quality) => (quality, false),
            None => (ChordQuality::Major, true),
        };

        Ok(Self {
            root: format!("{letter}{accidental}"),
            pitch_class: (base + offset).rem_euclid(12) as u8,
            quality,
            assumed_major,
        })
    }

    pub fn root_midi(&self, octave: i8) -> u8 {
        let midi = (octave as i32 + 1) * 12 + self.pitch_class as i32;
        midi.clamp(0, 127) as u8
    }

    pub fn midi_notes(&self, octave: i8) -> Vec<u8> {
        let root = self.root_midi(octave);
        self.quality
            .intervals()
            .iter()
            .map(|interval| root.saturating_add(*interval).min(127))
            .collect()
    }

    /// Sharp-spelled note names, e.g. `["C4", "E4", "G4"]`
    pub fn notes(&self, octave: i8) -> Vec<String> {
        self.midi_notes(octave).into_iter().map(midi_to_note_name).collect()
    }

    pub fn frequencies(&self, octave: i8) -> Vec<f32> {
        self.midi_notes(octave).into_iter().map(note_frequency).collect()
    }

    pub fn root_frequency(&self, octave: i8) -> f32 {
        note_frequency(self.root_midi(octave))
    }
}

/// Table value when the note is in guitar range, equal temperament otherwise
fn note_frequency(midi: u8) -> f32 {
    entry_for_midi(midi)
        .map(|entry| entry.hz)
        .unwrap_or_else(|| midi_to_frequency(midi))
}

pub fn midi_to_note_name(midi: u8) -> String {
    let octave = (midi / 12) as i32 - 1;
    format!("{}{}", SHARP_NAMES[(midi % 12) as usize], octave)
}

#[cfg(test)]
#[path = "test_chords.rs"]
mod tests;
