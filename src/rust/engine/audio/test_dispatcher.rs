use super::*;
use crate::engine::audio::context::ContextManager;
use crate::engine::audio::environment::EnvironmentProbe;
use crate::engine::host::{AudioHost, ClipSupport, RecordingHost, RecordingScript};
use crate::platform::config::EngineConfig;
use crate::shared::diagnostics::Verbosity;

fn dispatcher(script: RecordingScript) -> (Rc<RecordingHost>, HybridDispatcher) {
    let recording = Rc::new(RecordingHost::with_tokio(script));
    let host: Rc<dyn AudioHost> = recording.clone();
    let config = EngineConfig::default();
    let diagnostics = Rc::new(Diagnostics::new(200, Verbosity::Quiet));
    let probe = Rc::new(EnvironmentProbe::new(host.clone(), diagnostics.clone(), None));
    let context = ContextManager::new(host.clone(), config.unlock.clone(), diagnostics.clone(), probe.clone());
    let live = Rc::new(LiveBackend::new(
        host.clone(),
        context,
        probe.clone(),
        diagnostics.clone(),
        config.live.clone(),
    ));
    let clip = Rc::new(ClipBackend::new(host, probe, diagnostics.clone(), config.clip.clone()));
    (recording, HybridDispatcher::new(live, clip, diagnostics))
}

fn c_major() -> ChordRequest {
    ChordRequest::from_names(["C4", "E4", "G4"], false)
}

#[tokio::test(start_paused = true)]
async fn test_initialize_prefers_live_synthesis() {
    let (host, dispatcher) = dispatcher(RecordingScript::default());

    assert_eq!(dispatcher.mode(), BackendMode::Unresolved);
    assert_eq!(dispatcher.initialize(), BackendMode::LiveSynthesis);
    assert_eq!(dispatcher.initialize(), BackendMode::LiveSynthesis);

    let log = host.log();
    assert_eq!(log.graphs_created, 1);
    assert_eq!(log.voices.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_audio_api_resolves_to_clips() {
    let (host, dispatcher) = dispatcher(RecordingScript::without_audio());

    assert_eq!(dispatcher.initialize(), BackendMode::RenderedClip);
    assert!(dispatcher.play(&c_major()).await);
    assert_eq!(host.log().clip_plays.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_forced_live_without_audio_still_answers() {
    let mut script = RecordingScript::without_audio();
    script.clip_support = ClipSupport::No;
    let (_host, dispatcher) = dispatcher(script);

    dispatcher.force_live_mode();
    assert!(!dispatcher.play(&c_major()).await);
    assert_eq!(dispatcher.mode(), BackendMode::RenderedClip);
    assert!(!dispatcher.is_forced());
}

#[tokio::test(start_paused = true)]
async fn test_forced_clip_mode_skips_live_graph() {
    let (host, dispatcher) = dispatcher(RecordingScript::default());

    dispatcher.force_clip_mode();
    assert!(dispatcher.play(&c_major()).await);

    let log = host.log();
    assert_eq!(log.graphs_created, 0);
    assert_eq!(log.clip_plays, vec!["C4-E4-G4".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_live_failure_falls_through_to_clip() {
    let (host, dispatcher) = dispatcher(RecordingScript::default());
    assert_eq!(dispatcher.initialize(), BackendMode::LiveSynthesis);

    host.update_script(|script| script.schedule_fails = true);
    assert!(dispatcher.play(&c_major()).await);
    assert_eq!(host.log().clip_plays.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_live_play_schedules_one_voice_per_note() {
    let (host, dispatcher) = dispatcher(RecordingScript::default());

    assert!(dispatcher.play(&c_major()).await);

    let log = host.log();
    // Self-test voice plus three chord voices
    assert_eq!(log.voices.len(), 4);
    assert!(log.clip_plays.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_auto_detect_resets_unlock_budget() {
    let (_host, dispatcher) = dispatcher(RecordingScript::default());

    assert!(dispatcher.live().context().unlock().await);
    assert_eq!(dispatcher.live().context().attempt_count(), 1);
    dispatcher.force_clip_mode();

    assert_eq!(dispatcher.auto_detect_mode(), BackendMode::LiveSynthesis);
    assert_eq!(dispatcher.live().context().attempt_count(), 0);
    assert!(!dispatcher.is_forced());
}

#[tokio::test(start_paused = true)]
async fn test_stop_all_only_silences_clips() {
    let (host, dispatcher) = dispatcher(RecordingScript::default());

    dispatcher.play(&c_major()).await;
    dispatcher.force_clip_mode();
    dispatcher.play(&c_major()).await;

    assert_eq!(dispatcher.stop_all(), 3);
    assert_eq!(host.log().clip_stops, 1);
}

fn live_backend(script: RecordingScript) -> (Rc<RecordingHost>, Rc<Diagnostics>, LiveBackend) {
    let recording = Rc::new(RecordingHost::with_tokio(script));
    let host: Rc<dyn AudioHost> = recording.clone();
    let config = EngineConfig::default();
    let diagnostics = Rc::new(Diagnostics::new(200, Verbosity::Quiet));
    let probe = Rc::new(EnvironmentProbe::new(host.clone(), diagnostics.clone(), None));
    let context = ContextManager::new(host.clone(), config.unlock.clone(), diagnostics.clone(), probe.clone());
    let live = LiveBackend::new(host, context, probe, diagnostics.clone(), config.live);
    (recording, diagnostics, live)
}

#[tokio::test(start_paused = true)]
async fn test_live_rejects_unknown_notes_before_creating_a_graph() {
    let (host, _diagnostics, live) = live_backend(RecordingScript::default());
    let request = ChordRequest::from_names(["X9", "H2"], false);

    assert!(matches!(
        live.try_play(&request).await,
        Err(crate::engine::audio::error::AudioError::InvalidChordInput(_))
    ));
    assert!(!live.play(&request).await);
    assert_eq!(host.log().graphs_created, 0);
    assert!(host.log().voices.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_live_drops_unknown_notes_and_plays_the_rest() {
    let (host, diagnostics, live) = live_backend(RecordingScript::default());
    let request = ChordRequest::from_names(["C4", "X9", "G4"], false);

    assert!(live.play(&request).await);

    let freqs: Vec<f32> = host.log().voices.iter().map(|v| v.frequency).collect();
    assert_eq!(freqs, vec![261.63, 392.0]);
    assert!(diagnostics.entries().iter().any(|e| {
        e.level == crate::shared::diagnostics::DiagnosticLevel::Warn
            && e.category == "LIVE"
            && e.data.as_ref().is_some_and(|d| d.to_string().contains("X9"))
    }));
}
