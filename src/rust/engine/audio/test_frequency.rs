use super::*;

#[test]
fn test_every_entry_matches_equal_temperament() {
    for entry in NOTE_TABLE {
        let expected = 440.0_f64 * 2.0_f64.powf((entry.midi as f64 - 69.0) / 12.0);
        let resolved = frequency_of(entry.name).expect("table entry resolves") as f64;
        assert!(
            (resolved - expected).abs() <= 0.01,
            "{} resolved to {} (expected {})",
            entry.name,
            resolved,
            expected
        );
    }
}

#[test]
fn test_table_spelling_matches_parsed_midi() {
    for entry in NOTE_TABLE {
        assert_eq!(parse_note_to_midi(entry.name).unwrap(), entry.midi, "{}", entry.name);
    }
}

#[test]
fn test_table_covers_guitar_range() {
    assert_eq!(frequency_of("E2"), Some(82.41));
    assert_eq!(frequency_of("E6"), Some(1318.51));
    assert!(frequency_of("D#2").is_none());
    assert!(frequency_of("F6").is_none());
}

#[test]
fn test_parse_note_to_midi() {
    assert_eq!(parse_note_to_midi("C4").unwrap(), 60);
    assert_eq!(parse_note_to_midi("C#4").unwrap(), 61);
    assert_eq!(parse_note_to_midi("D4").unwrap(), 62);
    assert_eq!(parse_note_to_midi("A4").unwrap(), 69);
    assert_eq!(parse_note_to_midi("C5").unwrap(), 72);
    assert_eq!(parse_note_to_midi("Bb4").unwrap(), 70);
    assert_eq!(parse_note_to_midi("b3").unwrap(), 59);
    assert!(parse_note_to_midi("H4").is_err());
    assert!(parse_note_to_midi("C").is_err());
    assert!(parse_note_to_midi("").is_err());
}

#[test]
fn test_lookup_accepts_alternate_spellings() {
    assert_eq!(lookup("c#4").map(|e| e.name), Some("C#4"));
    assert_eq!(lookup(" Db4 ").map(|e| e.midi), Some(61));
    assert_eq!(name_for_midi(61), Some("C#4"));
    assert!(lookup("X9").is_none());
}

#[test]
fn test_midi_to_frequency() {
    let a4 = midi_to_frequency(69);
    assert!((a4 - 440.0).abs() < 0.1);

    let c4 = midi_to_frequency(60);
    assert!((c4 - 261.63).abs() < 0.5);
}
