//! Per-call chord playback request

use serde::{Deserialize, Serialize};

use super::error::{AudioError, AudioResult};
use super::frequency::lookup;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoteSource {
    Names(Vec<String>),
    Frequencies(Vec<f32>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordRequest {
    pub notes: NoteSource,
    pub strum: bool,
    /// Root note or chord name, used as the rendered-clip key
    pub root: Option<String>,
}

/// Frequencies that survived resolution, plus the names that did not
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedNotes {
    pub frequencies: Vec<f32>,
    pub dropped: Vec<String>,
}

impl ChordRequest {
    pub fn from_names<I, S>(names: I, strum: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            notes: NoteSource::Names(names.into_iter().map(Into::into).collect()),
            strum,
            root: None,
        }
    }

    pub fn from_frequencies(frequencies: Vec<f32>, strum: bool) -> Self {
        Self {
            notes: NoteSource::Frequencies(frequencies),
            strum,
            root: None,
        }
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Fails with `InvalidChordInput` when nothing resolves
    pub fn resolve(&self) -> AudioResult<ResolvedNotes> {
        let mut resolved = ResolvedNotes::default();

        match &self.notes {
            NoteSource::Names(names) => {
                for name in names {
                    match lookup(name) {
                        Some(entry) => resolved.frequencies.push(entry.hz),
                        None => resolved.dropped.push(name.clone()),
                    }
                }
            }
            NoteSource::Frequencies(frequencies) => {
                for hz in frequencies {
                    if hz.is_finite() && *hz > 0.0 {
                        resolved.frequencies.push(*hz);
                    } else {
                        resolved.dropped.push(hz.to_string());
                    }
                }
            }
        }

        if resolved.frequencies.is_empty() {
            return Err(AudioError::InvalidChordInput(format!(
                "no playable notes in {}",
                self.describe()
            )));
        }

        Ok(resolved)
    }

    /// Pool key for the rendered-clip backend
    pub fn clip_key(&self) -> String {
        if let Some(root) = &self.root {
            return root.clone();
        }
        match &self.notes {
            NoteSource::Names(names) => names.join("-"),
            NoteSource::Frequencies(frequencies) => frequencies
                .iter()
                .map(|hz| format!("{hz:.2}"))
                .collect::<Vec<_>>()
                .join("-"),
        }
    }

    pub fn describe(&self) -> String {
        match &self.notes {
            NoteSource::Names(names) => format!("[{}]", names.join(", ")),
            NoteSource::Frequencies(frequencies) => format!("{frequencies:?} Hz"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_notes_are_dropped() {
        let request = ChordRequest::from_names(["C4", "Q9", "G4"], false);
        let resolved = request.resolve().unwrap();
        assert_eq!(resolved.frequencies, vec![261.63, 392.0]);
        assert_eq!(resolved.dropped, vec!["Q9".to_string()]);
    }

    #[test]
    fn test_nothing_resolves_is_invalid_input() {
        let request = ChordRequest::from_names(["X1", "C9"], true);
        assert!(matches!(
            request.resolve(),
            Err(AudioError::InvalidChordInput(_))
        ));
        assert!(ChordRequest::from_names(Vec::<String>::new(), false).resolve().is_err());
    }

    #[test]
    fn test_invalid_frequencies_are_dropped() {
        let request = ChordRequest::from_frequencies(vec![440.0, -1.0, f32::NAN], false);
        let resolved = request.resolve().unwrap();
        assert_eq!(resolved.frequencies, vec![440.0]);
        assert_eq!(resolved.dropped.len(), 2);
    }

    #[test]
    fn test_clip_key_prefers_root() {
        let request = ChordRequest::from_names(["C4", "E4", "G4"], false);
        assert_eq!(request.clip_key(), "C4-E4-G4");
        assert_eq!(request.with_root("C major").clip_key(), "C major");
    }
}
