use serde::{Deserialize, Serialize};

use crate::engine::audio::frequency::{HIGHEST_MIDI, name_for_midi};

/// Open strings from string 6 (low E) to string 1 (high E), as MIDI numbers
pub const STANDARD_TUNING: [u8; 6] = [40, 45, 50, 55, 59, 64];

pub const MUTED: i8 = -1;

/// A finger on the fretboard. `string` is 6 (lowest) to 1 (highest);
/// `fret` is -1 for muted, 0 for open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FretPosition {
    pub string: u8,
    pub fret: i8,
}

impl FretPosition {
    pub fn new(string: u8, fret: i8) -> Self {
        Self { string, fret }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FretboardNotes {
    /// Low string to high string
    pub notes: Vec<String>,
    pub muted_strings: Vec<u8>,
    /// Positions whose note falls outside the frequency table
    pub dropped: Vec<FretPosition>,
}

pub fn positions_to_notes(positions: &[FretPosition]) -> FretboardNotes {
    let mut out = FretboardNotes::default();

    for string in (1..=6u8).rev() {
        let position = positions.iter().find(|p| p.string == string);
        let fret = match position {
            Some(p) if p.fret > MUTED => p.fret,
            _ => {
                out.muted_strings.push(string);
                continue;
            }
        };

        let open = STANDARD_TUNING[(6 - string) as usize];
        let midi = open as i32 + fret as i32;
        match u8::try_from(midi)
            .ok()
            .filter(|m| *m <= HIGHEST_MIDI)
            .and_then(name_for_midi)
        {
            Some(name) => out.notes.push(name.to_string()),
            None => out.dropped.push(FretPosition::new(string, fret)),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_c_major_shape() {
        // x32010
        let positions = [
            FretPosition::new(6, -1),
            FretPosition::new(5, 3),
            FretPosition::new(4, 2),
            FretPosition::new(3, 0),
            FretPosition::new(2, 1),
            FretPosition::new(1, 0),
        ];
        let mapped = positions_to_notes(&positions);
        assert_eq!(mapped.notes, vec!["C3", "E3", "G3", "C4", "E4"]);
        assert_eq!(mapped.muted_strings, vec![6]);
        assert!(mapped.dropped.is_empty());
    }

    #[test]
    fn test_missing_strings_count_as_muted() {
        let mapped = positions_to_notes(&[FretPosition::new(1, 0)]);
        assert_eq!(mapped.notes, vec!["E4"]);
        assert_eq!(mapped.muted_strings, vec![6, 5, 4, 3, 2]);
    }

    #[test]
    fn test_frets_beyond_table_are_dropped() {
        let mapped = positions_to_notes(&[FretPosition::new(1, 25), FretPosition::new(2, 24)]);
        assert_eq!(mapped.notes, vec!["B5"]);
        assert_eq!(mapped.dropped, vec![FretPosition::new(1, 25)]);
    }
}
