use std::rc::Rc;
use std::time::Duration;

use strumkit::engine::audio::{AudioEngine, BackendMode, PlayOptions, PlayTarget};
use strumkit::engine::host::{
    AudioHost, ClipBehavior, ContextState, RecordingHost, RecordingScript, ResumeBehavior,
};
use strumkit::platform::config::EngineConfig;

fn engine_on(script: RecordingScript) -> (Rc<RecordingHost>, AudioEngine) {
    let recording = Rc::new(RecordingHost::with_tokio(script));
    let host: Rc<dyn AudioHost> = recording.clone();
    (recording, AudioEngine::new(host, EngineConfig::default()))
}

fn notes(names: &[&str]) -> PlayTarget {
    PlayTarget::Notes(names.iter().map(|n| n.to_string()).collect())
}

#[tokio::test(start_paused = true)]
async fn restricted_device_with_stuck_resume_still_plays_live() {
    let mut script = RecordingScript::restricted();
    script.resume = ResumeBehavior::Hangs;
    let (host, engine) = engine_on(script);

    let started = tokio::time::Instant::now();
    let played = engine
        .play(&notes(&["E3", "G#3", "B3"]), PlayOptions { strum: true })
        .await;

    assert!(played);
    assert!(started.elapsed() < Duration::from_secs(8));
    let status = engine.status();
    assert!(status.is_unlocked);
    assert_eq!(status.backend_mode, BackendMode::LiveSynthesis);
    assert_eq!(status.context_state, ContextState::Suspended);

    let log = host.log();
    assert!(log.clip_plays.is_empty());
    let chord = &log.voices[log.voices.len() - 3..];
    assert!(chord[1].start_at > chord[0].start_at);
}

#[tokio::test(start_paused = true)]
async fn restricted_device_refusing_pooled_clips_gets_single_shot() {
    let mut script = RecordingScript::restricted();
    script.clip = ClipBehavior::RejectPooled;
    let (host, engine) = engine_on(script);

    assert!(engine.play(&PlayTarget::Chord("D".into()), PlayOptions::default()).await);

    let log = host.log();
    assert_eq!(log.single_shot_players_created, 1);
    assert_eq!(log.clip_plays.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn mode_switches_are_reported_in_status() {
    let (_host, engine) = engine_on(RecordingScript::default());

    assert_eq!(engine.force_clip_mode(), BackendMode::RenderedClip);
    assert!(engine.status().forced_mode);

    assert_eq!(engine.auto_detect_mode(), BackendMode::LiveSynthesis);
    let status = engine.status();
    assert!(!status.forced_mode);
    assert_eq!(status.backend_mode, BackendMode::LiveSynthesis);
}
