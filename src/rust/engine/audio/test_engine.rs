use super::*;
use crate::engine::host::{ClipSupport, RecordingHost, RecordingScript};

fn engine(script: RecordingScript) -> (Rc<RecordingHost>, AudioEngine) {
    let recording = Rc::new(RecordingHost::with_tokio(script));
    let host: Rc<dyn AudioHost> = recording.clone();
    (recording, AudioEngine::new(host, EngineConfig::default()))
}

fn notes(names: &[&str]) -> PlayTarget {
    PlayTarget::Notes(names.iter().map(|n| n.to_string()).collect())
}

#[tokio::test(start_paused = true)]
async fn test_live_chord_on_unlocked_context() {
    let (host, engine) = engine(RecordingScript::default());
    assert!(engine.unlock().await);

    let played = engine
        .play(&notes(&["C4", "E4", "G4"]), PlayOptions { strum: false })
        .await;

    assert!(played);
    assert_eq!(engine.mode(), BackendMode::LiveSynthesis);
    let log = host.log();
    let chord = &log.voices[log.voices.len() - 3..];
    let start = chord[0].start_at;
    for voice in chord {
        assert_eq!(voice.start_at, start);
        assert!(voice.stop_at <= start + engine.config().live.duration_secs + 1e-9);
    }
    let freqs: Vec<f32> = chord.iter().map(|v| v.frequency).collect();
    assert_eq!(freqs, vec![261.63, 329.63, 392.0]);
}

#[tokio::test(start_paused = true)]
async fn test_chord_name_builds_clip_pool_lazily() {
    let (host, engine) = engine(RecordingScript::default());

    assert!(engine.play(&PlayTarget::Chord("C major".into()), PlayOptions::default()).await);

    let status = engine.status();
    assert_eq!(status.pooled_key_count, 1);
    assert_eq!(status.pooled_player_count, 3);
    let log = host.log();
    assert_eq!(log.clip_plays, vec!["C major".to_string()]);
    assert_eq!(log.graphs_created, 0);
}

#[tokio::test(start_paused = true)]
async fn test_forced_live_without_any_audio_returns_false() {
    let mut script = RecordingScript::without_audio();
    script.clip_support = ClipSupport::No;
    let (_host, engine) = engine(script);

    engine.force_live_mode();
    assert!(!engine.play(&notes(&["C4", "E4", "G4"]), PlayOptions::default()).await);
    assert_eq!(engine.mode(), BackendMode::RenderedClip);
}

#[tokio::test(start_paused = true)]
async fn test_forced_live_without_graph_falls_back_to_clips() {
    let (host, engine) = engine(RecordingScript::without_audio());

    engine.force_live_mode();
    assert!(engine.play(&notes(&["C4", "E4", "G4"]), PlayOptions::default()).await);
    assert_eq!(host.log().clip_plays.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_chord_falls_back_to_live_notes() {
    let mut script = RecordingScript::default();
    script.clip_support = ClipSupport::No;
    let (host, engine) = engine(script);

    assert!(engine.play(&PlayTarget::Chord("Am".into()), PlayOptions { strum: true }).await);

    let log = host.log();
    let chord = &log.voices[log.voices.len() - 3..];
    let freqs: Vec<f32> = chord.iter().map(|v| v.frequency).collect();
    assert_eq!(freqs, vec![220.0, 261.63, 329.63]);
    assert!(chord[1].start_at > chord[0].start_at);
}

#[tokio::test(start_paused = true)]
async fn test_unparseable_chord_returns_false() {
    let (host, engine) = engine(RecordingScript::default());

    assert!(!engine.play(&PlayTarget::Chord("H".into()), PlayOptions::default()).await);
    assert!(host.log().clip_plays.is_empty());
    assert!(
        engine
            .diagnostics()
            .entries()
            .iter()
            .any(|e| e.message == "Play request produced no sound")
    );
}

#[tokio::test(start_paused = true)]
async fn test_fingering_plays_sounding_strings() {
    let (host, engine) = engine(RecordingScript::default());
    let shape = [
        FretPosition::new(6, -1),
        FretPosition::new(5, 3),
        FretPosition::new(4, 2),
        FretPosition::new(3, 0),
        FretPosition::new(2, 1),
        FretPosition::new(1, 0),
    ];

    assert!(engine.play_positions(&shape, PlayOptions { strum: true }).await);
    // Self-test voice plus five strings
    assert_eq!(host.log().voices.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_all_muted_fingering_is_rejected() {
    let (host, engine) = engine(RecordingScript::default());

    assert!(!engine.play_positions(&[], PlayOptions::default()).await);
    assert_eq!(host.log().graphs_created, 0);
}

#[tokio::test(start_paused = true)]
async fn test_preload_common_chords() {
    let (host, engine) = engine(RecordingScript::default());

    assert_eq!(engine.preload_common(), COMMON_CHORDS.len());
    assert_eq!(engine.status().pooled_key_count, 9);
    assert!(host.log().clip_plays.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_export_bundles_device_status_and_logs() {
    let (_host, engine) = engine(RecordingScript::default());
    engine.play(&notes(&["E3"]), PlayOptions::default()).await;

    let report: serde_json::Value = serde_json::from_str(&engine.export_diagnostics()).unwrap();

    assert!(
        report["deviceInfo"]["userAgent"]
            .as_str()
            .unwrap()
            .contains("Linux")
    );
    assert_eq!(report["audioStatus"]["sessionId"], engine.session_id());
    assert_eq!(report["audioStatus"]["backendMode"], "live-synthesis");
    assert_eq!(report["audioStatus"]["liveStopSupported"], false);
    assert!(!report["logs"].as_array().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clear_diagnostics_leaves_one_entry() {
    let (_host, engine) = engine(RecordingScript::default());
    engine.preload("G");

    engine.clear_diagnostics();
    let entries = engine.diagnostics().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, "DEBUG");
}

#[tokio::test(start_paused = true)]
async fn test_close_tears_down_context() {
    let (host, engine) = engine(RecordingScript::default());
    assert!(engine.unlock().await);

    assert!(engine.close().await);
    let status = engine.status();
    assert_eq!(status.context_state, ContextState::Uninstantiated);
    assert!(!status.is_unlocked);
    assert_eq!(host.log().close_calls, 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_all_counts_clip_players() {
    let (host, engine) = engine(RecordingScript::default());
    engine.play(&PlayTarget::Chord("G".into()), PlayOptions::default()).await;
    engine.play(&PlayTarget::Chord("G".into()), PlayOptions::default()).await;

    assert_eq!(engine.stop_all(), 3);
    assert_eq!(host.log().clip_stops, 2);
}
