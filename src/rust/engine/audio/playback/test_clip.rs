use super::*;
use crate::engine::host::{ClipBehavior, ClipSupport, RecordingHost, RecordingScript};
use crate::shared::diagnostics::Verbosity;

fn backend_with(script: RecordingScript, config: ClipSection) -> (Rc<RecordingHost>, ClipBackend) {
    let recording = Rc::new(RecordingHost::with_tokio(script));
    let host: Rc<dyn AudioHost> = recording.clone();
    let diagnostics = Rc::new(Diagnostics::new(200, Verbosity::Quiet));
    let probe = Rc::new(EnvironmentProbe::new(host.clone(), diagnostics.clone(), None));
    (recording, ClipBackend::new(host, probe, diagnostics, config))
}

fn backend(script: RecordingScript) -> (Rc<RecordingHost>, ClipBackend) {
    backend_with(script, ClipSection::default())
}

fn chord(name: &str) -> ClipSource {
    ClipSource::ChordName(name.to_string())
}

#[tokio::test]
async fn test_rapid_plays_overflow_into_transients() {
    let (host, clips) = backend(RecordingScript::default());

    for _ in 0..5 {
        assert!(clips.play(&chord("C")).await);
    }

    assert_eq!(clips.pooled_players("C"), 3);
    let stats = clips.stats();
    assert_eq!(stats.pooled_keys, 1);
    assert_eq!(stats.transient_players, 2);

    let log = host.log();
    assert_eq!(log.clip_plays.len(), 5);
    assert_eq!(log.clip_players_created, 5);
}

#[tokio::test]
async fn test_finished_pooled_players_are_reused() {
    let (host, clips) = backend(RecordingScript::default());

    for _ in 0..3 {
        assert!(clips.play(&chord("G")).await);
    }
    host.finish_all();
    assert!(clips.play(&chord("G")).await);

    assert_eq!(host.log().clip_players_created, 3);
    assert_eq!(clips.stats().transient_players, 0);
}

#[tokio::test]
async fn test_least_recently_used_key_is_evicted() {
    let config = ClipSection {
        max_pooled_keys: 2,
        ..ClipSection::default()
    };
    let (_host, clips) = backend_with(RecordingScript::default(), config);

    clips.preload(&chord("C")).unwrap();
    clips.preload(&chord("G")).unwrap();
    assert!(clips.play(&chord("C")).await);
    clips.preload(&chord("Am")).unwrap();

    assert!(clips.has_pool("C"));
    assert!(clips.has_pool("Am"));
    assert!(!clips.has_pool("G"));
    assert_eq!(clips.stats().pooled_keys, 2);
}

#[tokio::test]
async fn test_rejected_play_retries_single_shot_when_restricted() {
    let mut script = RecordingScript::restricted();
    script.clip = ClipBehavior::RejectPooled;
    let (host, clips) = backend(script);

    assert!(clips.play(&chord("Em")).await);

    let log = host.log();
    assert_eq!(log.rejected_plays, 1);
    assert_eq!(log.single_shot_players_created, 1);
    assert_eq!(log.clip_plays, vec!["Em".to_string()]);
}

#[tokio::test]
async fn test_rejected_play_fails_when_unrestricted() {
    let mut script = RecordingScript::default();
    script.clip = ClipBehavior::RejectPooled;
    let (host, clips) = backend(script);

    assert!(!clips.play(&chord("Em")).await);
    assert_eq!(host.log().single_shot_players_created, 0);
}

#[tokio::test]
async fn test_single_shot_rejection_is_reported() {
    let mut script = RecordingScript::restricted();
    script.clip = ClipBehavior::RejectAll;
    let (host, clips) = backend(script);

    let result = clips.try_play(&chord("D")).await;
    assert!(matches!(result, Err(AudioError::PlaybackRejected(_))));
    assert_eq!(host.log().rejected_plays, 2);
}

#[tokio::test]
async fn test_unsupported_host_creates_nothing() {
    let mut script = RecordingScript::default();
    script.clip_support = ClipSupport::No;
    let (host, clips) = backend(script);

    assert!(!clips.is_supported());
    assert!(!clips.play(&chord("C")).await);
    assert_eq!(host.log().clip_players_created, 0);
}

#[tokio::test]
async fn test_invalid_chord_builds_no_pool() {
    let (_host, clips) = backend(RecordingScript::default());

    let result = clips.try_play(&chord("H7")).await;
    assert!(matches!(result, Err(AudioError::InvalidChordInput(_))));
    assert_eq!(clips.stats().pooled_keys, 0);
}

#[tokio::test]
async fn test_stop_all_stops_playing_players() {
    let (host, clips) = backend(RecordingScript::default());

    for _ in 0..4 {
        clips.play(&chord("A")).await;
    }
    let stopped = clips.stop_all();

    assert_eq!(stopped, 4);
    assert_eq!(host.log().clip_stops, 4);
    assert_eq!(clips.stats().transient_players, 0);
}

#[tokio::test]
async fn test_request_source_uses_its_key() {
    let (host, clips) = backend(RecordingScript::default());
    let request = ChordRequest::from_names(["E3", "B3", "E4"], true).with_root("E5");

    assert!(clips.play(&ClipSource::Request(request)).await);
    assert!(clips.has_pool("E5"));
    assert_eq!(host.log().clip_plays, vec!["E5".to_string()]);
}
