use std::rc::Rc;

use super::*;
use crate::engine::host::{AudioHost, RecordingHost, RecordingScript};
use crate::platform::config::EngineConfig;

fn chords(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_progression_waits_between_chords() {
    let recording = Rc::new(RecordingHost::with_tokio(RecordingScript::default()));
    let host: Rc<dyn AudioHost> = recording.clone();
    let engine = AudioEngine::new(host, EngineConfig::default());

    let started = tokio::time::Instant::now();
    let outcome = play_progression(
        &engine,
        &chords(&["C", "Am", "F", "G"]),
        Duration::from_millis(1500),
        PlayOptions::default(),
    )
    .await;

    assert!(outcome.all_played());
    assert!(started.elapsed() >= Duration::from_millis(4500));
    assert!(started.elapsed() < Duration::from_millis(6000));
    assert_eq!(recording.log().clip_plays, chords(&["C", "Am", "F", "G"]));
}

#[tokio::test(start_paused = true)]
async fn test_failed_chord_does_not_stop_progression() {
    let host: Rc<dyn AudioHost> = Rc::new(RecordingHost::with_tokio(RecordingScript::default()));
    let engine = AudioEngine::new(host, EngineConfig::default());

    let outcome = play_progression(
        &engine,
        &chords(&["C", "H", "G"]),
        Duration::from_millis(10),
        PlayOptions::default(),
    )
    .await;

    assert_eq!(outcome.played_count(), 2);
    assert!(!outcome.all_played());
    assert!(!outcome.chords[1].played);
}
