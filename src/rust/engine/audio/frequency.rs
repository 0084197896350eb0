//! Frequency table covering the guitar's practical range (E2 to E6)
//!
//! Values are 12-tone equal temperament (A4 = 440 Hz) rounded to 0.01 Hz.
//! Sharps and flats are both listed; the sharp spelling comes first.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::error::{AudioError, AudioResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEntry {
    pub name: &'static str,
    pub midi: u8,
    pub hz: f32,
}

pub const LOWEST_MIDI: u8 = 40;
pub const HIGHEST_MIDI: u8 = 88;

pub static NOTE_TABLE: &[NoteEntry] = &[
    NoteEntry { name: "E2", midi: 40, hz: 82.41 },
    NoteEntry { name: "F2", midi: 41, hz: 87.31 },
    NoteEntry { name: "F#2", midi: 42, hz: 92.50 },
    NoteEntry { name: "Gb2", midi: 42, hz: 92.50 },
    NoteEntry { name: "G2", midi: 43, hz: 98.00 },
    NoteEntry { name: "G#2", midi: 44, hz: 103.83 },
    NoteEntry { name: "Ab2", midi: 44, hz: 103.83 },
    NoteEntry { name: "A2", midi: 45, hz: 110.00 },
    NoteEntry { name: "A#2", midi: 46, hz: 116.54 },
    NoteEntry { name: "Bb2", midi: 46, hz: 116.54 },
    NoteEntry { name: "B2", midi: 47, hz: 123.47 },
    NoteEntry { name: "C3", midi: 48, hz: 130.81 },
    NoteEntry { name: "C#3", midi: 49, hz: 138.59 },
    NoteEntry { name: "Db3", midi: 49, hz: 138.59 },
    NoteEntry { name: "D3", midi: 50, hz: 146.83 },
    NoteEntry { name: "D#3", midi: 51, hz: 155.56 },
    NoteEntry { name: "Eb3", midi: 51, hz: 155.56 },
    NoteEntry { name: "E3", midi: 52, hz: 164.81 },
    NoteEntry { name: "F3", midi: 53, hz: 174.61 },
    NoteEntry { name: "F#3", midi: 54, hz: 185.00 },
    NoteEntry { name: "Gb3", midi: 54, hz: 185.00 },
    NoteEntry { name: "G3", midi: 55, hz: 196.00 },
    NoteEntry { name: "G#3", midi: 56, hz: 207.65 },
    NoteEntry { name: "Ab3", midi: 56, hz: 207.65 },
    NoteEntry { name: "A3", midi: 57, hz: 220.00 },
    NoteEntry { name: "A#3", midi: 58, hz: 233.08 },
    NoteEntry { name: "Bb3", midi: 58, hz: 233.08 },
    NoteEntry { name: "B3", midi: 59, hz: 246.94 },
    NoteEntry { name: "C4", midi: 60, hz: 261.63 },
    NoteEntry { name: "C#4", midi: 61, hz: 277.18 },
    NoteEntry { name: "Db4", midi: 61, hz: 277.18 },
    NoteEntry { name: "D4", midi: 62, hz: 293.66 },
    NoteEntry { name: "D#4", midi: 63, hz: 311.13 },
    NoteEntry { name: "Eb4", midi: 63, hz: 311.13 },
    NoteEntry { name: "E4", midi: 64, hz: 329.63 },
    NoteEntry { name: "F4", midi: 65, hz: 349.23 },
    NoteEntry { name: "F#4", midi: 66, hz: 369.99 },
    NoteEntry { name: "Gb4", midi: 66, hz: 369.99 },
    NoteEntry { name: "G4", midi: 67, hz: 392.00 },
    NoteEntry { name: "G#4", midi: 68, hz: 415.30 },
    NoteEntry { name: "Ab4", midi: 68, hz: 415.30 },
    NoteEntry { name: "A4", midi: 69, hz: 440.00 },
    NoteEntry { name: "A#4", midi: 70, hz: 466.16 },
    NoteEntry { name: "Bb4", midi: 70, hz: 466.16 },
    NoteEntry { name: "B4", midi: 71, hz: 493.88 },
    NoteEntry { name: "C5", midi: 72, hz: 523.25 },
    NoteEntry { name: "C#5", midi: 73, hz: 554.37 },
    NoteEntry { name: "Db5", midi: 73, hz: 554.37 },
    NoteEntry { name: "D5", midi: 74, hz: 587.33 },
    NoteEntry { name: "D#5", midi: 75, hz: 622.25 },
    NoteEntry { name: "Eb5", midi: 75, hz: 622.25 },
    NoteEntry { name: "E5", midi: 76, hz: 659.26 },
    NoteEntry { name: "F5", midi: 77, hz: 698.46 },
    NoteEntry { name: "F#5", midi: 78, hz: 739.99 },
    NoteEntry { name: "Gb5", midi: 78, hz: 739.99 },
    NoteEntry { name: "G5", midi: 79, hz: 783.99 },
    NoteEntry { name: "G#5", midi: 80, hz: 830.61 },
    NoteEntry { name: "Ab5", midi: 80, hz: 830.61 },
    NoteEntry { name: "A5", midi: 81, hz: 880.00 },
    NoteEntry { name: "A#5", midi: 82, hz: 932.33 },
    NoteEntry { name: "Bb5", midi: 82, hz: 932.33 },
    NoteEntry { name: "B5", midi: 83, hz: 987.77 },
    NoteEntry { name: "C6", midi: 84, hz: 1046.50 },
    NoteEntry { name: "C#6", midi: 85, hz: 1108.73 },
    NoteEntry { name: "Db6", midi: 85, hz: 1108.73 },
    NoteEntry { name: "D6", midi: 86, hz: 1174.66 },
    NoteEntry { name: "D#6", midi: 87, hz: 1244.51 },
    NoteEntry { name: "Eb6", midi: 87, hz: 1244.51 },
    NoteEntry { name: "E6", midi: 88, hz: 1318.51 },
];

static BY_NAME: Lazy<HashMap<&'static str, &'static NoteEntry>> =
    Lazy::new(|| NOTE_TABLE.iter().map(|entry| (entry.name, entry)).collect());

/// Look up a note by its exact table spelling, falling back to a parsed
/// spelling so "c#4" or "Db4" both resolve.
pub fn lookup(name: &str) -> Option<&'static NoteEntry> {
    let trimmed = name.trim();
    if let Some(entry) = BY_NAME.get(trimmed) {
        return Some(entry);
    }
    let midi = parse_note_to_midi(trimmed).ok()?;
    entry_for_midi(midi)
}

pub fn frequency_of(name: &str) -> Option<f32> {
    lookup(name).map(|entry| entry.hz)
}

/// Sharp-spelled entry for a MIDI number inside the table range
pub fn entry_for_midi(midi: u8) -> Option<&'static NoteEntry> {
    NOTE_TABLE.iter().find(|entry| entry.midi == midi)
}

pub fn name_for_midi(midi: u8) -> Option<&'static str> {
    entry_for_midi(midi).map(|entry| entry.name)
}

/// Convert MIDI note to frequency in Hz
pub fn midi_to_frequency(midi_note: u8) -> f32 {
    440.0 * 2.0_f32.powf((midi_note as f32 - 69.0) / 12.0)
}

/// Parse note name to MIDI number
/// C4 = 60, C#4 = 61, Db4 = 61, A4 = 69
pub fn parse_note_to_midi(note: &str) -> AudioResult<u8> {
    let mut chars = note.trim().chars();

    let base_char = chars
        .next()
        .ok_or_else(|| AudioError::InvalidChordInput("empty note name".into()))?;
    let base_note: i32 = match base_char.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => {
            return Err(AudioError::InvalidChordInput(format!(
                "invalid note letter in {note:?}"
            )));
        }
    };

    let rest: String = chars.collect();
    let (offset, octave_str) = if let Some(stripped) = rest.strip_prefix('#') {
        (1, stripped)
    } else if let Some(stripped) = rest.strip_prefix('b') {
        (-1, stripped)
    } else {
        (0, rest.as_str())
    };

    let octave: i32 = octave_str
        .parse()
        .map_err(|_| AudioError::InvalidChordInput(format!("invalid octave in {note:?}")))?;

    let midi = (octave + 1) * 12 + base_note + offset;
    if !(0..=127).contains(&midi) {
        return Err(AudioError::InvalidChordInput(format!(
            "MIDI note out of range: {midi}"
        )));
    }

    Ok(midi as u8)
}

#[cfg(test)]
#[path = "test_frequency.rs"]
mod tests;
