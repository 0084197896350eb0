use super::*;

#[test]
fn test_parse_chord_names() {
    let c = ChordName::parse("C").unwrap();
    assert_eq!(c.root, "C");
    assert_eq!(c.quality, ChordQuality::Major);
    assert!(!c.assumed_major);

    let c_major = ChordName::parse("C major").unwrap();
    assert_eq!(c_major.quality, ChordQuality::Major);

    let am = ChordName::parse("Am").unwrap();
    assert_eq!(am.pitch_class, 9);
    assert_eq!(am.quality, ChordQuality::Minor);

    let fsm7 = ChordName::parse("F#m7").unwrap();
    assert_eq!(fsm7.root, "F#");
    assert_eq!(fsm7.pitch_class, 6);
    assert_eq!(fsm7.quality, ChordQuality::Minor7);

    let bbmaj7 = ChordName::parse("Bbmaj7").unwrap();
    assert_eq!(bbmaj7.root, "Bb");
    assert_eq!(bbmaj7.pitch_class, 10);
    assert_eq!(bbmaj7.quality, ChordQuality::Major7);

    assert_eq!(ChordName::parse("Dsus4").unwrap().quality, ChordQuality::Sus4);
    assert_eq!(ChordName::parse("Bdim").unwrap().quality, ChordQuality::Diminished);
    assert_eq!(ChordName::parse("G7").unwrap().quality, ChordQuality::Dominant7);
}

#[test]
fn test_major_seventh_is_case_sensitive() {
    assert_eq!(ChordName::parse("CM7").unwrap().quality, ChordQuality::Major7);
    assert_eq!(ChordName::parse("Cm7").unwrap().quality, ChordQuality::Minor7);
}

#[test]
fn test_unknown_suffix_assumes_major() {
    let chord = ChordName::parse("Cadd9").unwrap();
    assert_eq!(chord.quality, ChordQuality::Major);
    assert!(chord.assumed_major);
}

#[test]
fn test_unparsable_root_is_invalid_input() {
    assert!(matches!(
        ChordName::parse("Hm"),
        Err(AudioError::InvalidChordInput(_))
    ));
    assert!(ChordName::parse("").is_err());
}

#[test]
fn test_chord_notes() {
    let cmaj7 = ChordName::parse("Cmaj7").unwrap();
    assert_eq!(cmaj7.notes(4), vec!["C4", "E4", "G4", "B4"]);

    let dmin = ChordName::parse("Dmin").unwrap();
    assert_eq!(dmin.notes(4), vec!["D4", "F4", "A4"]);

    let bb = ChordName::parse("Bb").unwrap();
    assert_eq!(bb.notes(3), vec!["A#3", "D4", "F4"]);
}

#[test]
fn test_chord_frequencies_use_table_values() {
    let c = ChordName::parse("C").unwrap();
    assert_eq!(c.frequencies(4), vec![261.63, 329.63, 392.0]);
    assert_eq!(c.root_frequency(4), 261.63);
}
