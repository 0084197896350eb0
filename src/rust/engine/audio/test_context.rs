use std::time::Duration;

use super::*;
use crate::engine::host::{RecordingHost, RecordingScript, ResumeBehavior, VoiceEnd};
use crate::shared::diagnostics::Verbosity;

fn manager_with(host: &Rc<RecordingHost>, config: UnlockSection) -> ContextManager {
    let diagnostics = Rc::new(Diagnostics::new(200, Verbosity::Quiet));
    let host: Rc<dyn AudioHost> = host.clone();
    let probe = Rc::new(EnvironmentProbe::new(
        host.clone(),
        diagnostics.clone(),
        config.restricted_override,
    ));
    ContextManager::new(host, config, diagnostics, probe)
}

fn manager(script: RecordingScript) -> (Rc<RecordingHost>, ContextManager) {
    let host = Rc::new(RecordingHost::with_tokio(script));
    let manager = manager_with(&host, UnlockSection::default());
    (host, manager)
}

#[tokio::test(start_paused = true)]
async fn test_unlock_is_idempotent_once_running() {
    let (host, manager) = manager(RecordingScript::default());

    assert!(manager.unlock().await);
    assert_eq!(manager.attempt_count(), 1);

    assert!(manager.unlock().await);
    assert!(manager.unlock().await);
    assert_eq!(manager.attempt_count(), 1);
    assert_eq!(host.log().graphs_created, 1);
}

#[tokio::test(start_paused = true)]
async fn test_standard_unlock_resumes_and_plays_one_test_tone() {
    let mut script = RecordingScript::default();
    script.initial_state = ContextState::Suspended;
    let (host, manager) = manager(script);

    assert!(manager.unlock().await);
    assert_eq!(manager.state(), ContextState::Running);

    let log = host.log();
    assert_eq!(log.resume_calls, 1);
    assert_eq!(log.voices.len(), 1);
    assert_eq!(log.voices[0].frequency, 440.0);
    assert_eq!(log.voices[0].waveform, Waveform::Sine);
}

#[tokio::test(start_paused = true)]
async fn test_attempts_never_exceed_maximum() {
    let mut script = RecordingScript::default();
    script.initial_state = ContextState::Suspended;
    script.resume = ResumeBehavior::Fails;
    let (host, manager) = manager(script);

    for _ in 0..8 {
        assert!(!manager.unlock().await);
        assert!(manager.attempt_count() <= 5);
    }
    assert_eq!(manager.attempt_count(), 5);
    assert_eq!(
        manager.last_error(),
        Some(AudioError::UnlockExhausted { attempts: 5 })
    );
    assert_eq!(host.log().resume_calls, 5);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_unlocks_share_one_attempt() {
    let mut script = RecordingScript::default();
    script.initial_state = ContextState::Suspended;
    let (host, manager) = manager(script);

    let (first, second) = futures::join!(manager.unlock(), manager.unlock());

    assert!(first);
    assert_eq!(first, second);
    assert_eq!(manager.attempt_count(), 1);
    let log = host.log();
    assert_eq!(log.graphs_created, 1);
    assert_eq!(log.resume_calls, 1);
}

#[tokio::test(start_paused = true)]
async fn test_restricted_environment_tolerates_suspended() {
    let mut script = RecordingScript::restricted();
    script.resume = ResumeBehavior::NoEffect;
    let (host, manager) = manager(script);

    assert!(manager.detect_restricted_environment());
    assert!(manager.unlock().await);
    assert_eq!(manager.state(), ContextState::Suspended);

    // Aggressive path: several resumes and four test tones
    let log = host.log();
    assert_eq!(log.resume_calls, 5);
    assert_eq!(log.voices.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_suspended_is_failure_on_unrestricted_environment() {
    let mut script = RecordingScript::default();
    script.initial_state = ContextState::Suspended;
    script.resume = ResumeBehavior::NoEffect;
    let (_host, manager) = manager(script);

    assert!(!manager.unlock().await);
    assert!(matches!(
        manager.last_error(),
        Some(AudioError::UnlockTimeout { attempt: 1, max_attempts: 5 })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_hanging_resume_does_not_abort_unlock() {
    let mut script = RecordingScript::restricted();
    script.resume = ResumeBehavior::Hangs;
    let host = Rc::new(RecordingHost::with_tokio(script));
    let config = UnlockSection {
        aggressiveness: Aggressiveness::Standard,
        ..UnlockSection::default()
    };
    let manager = manager_with(&host, config);

    let started = tokio::time::Instant::now();
    assert!(manager.unlock().await);
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert!(started.elapsed() < Duration::from_secs(8));
}

#[tokio::test(start_paused = true)]
async fn test_hanging_resume_unlocks_restricted_with_default_config() {
    let mut script = RecordingScript::restricted();
    script.resume = ResumeBehavior::Hangs;
    let (host, manager) = manager(script);

    let started = tokio::time::Instant::now();
    assert!(manager.unlock().await);
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert!(started.elapsed() < Duration::from_secs(8));

    assert_eq!(manager.state(), ContextState::Suspended);
    assert!(manager.last_error().is_none());
    let log = host.log();
    // One hung resume ends the resume rounds; every test tone still plays
    assert_eq!(log.resume_calls, 1);
    assert_eq!(log.voices.len(), 4);
    assert_eq!(log.close_calls, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unlock_attempt_is_bounded() {
    let mut script = RecordingScript::default();
    script.initial_state = ContextState::Suspended;
    script.resume = ResumeBehavior::Hangs;
    script.voice_end = VoiceEnd::Never;
    let host = Rc::new(RecordingHost::with_tokio(script));
    let config = UnlockSection {
        aggressiveness: Aggressiveness::Aggressive,
        ..UnlockSection::default()
    };
    let manager = manager_with(&host, config);

    let started = tokio::time::Instant::now();
    assert!(!manager.unlock().await);
    assert!(started.elapsed() >= Duration::from_secs(8));
    assert!(started.elapsed() < Duration::from_secs(10));

    // Failed aggressive attempt closes the graph; the next one builds a new one
    assert_eq!(manager.state(), ContextState::Uninstantiated);
    assert_eq!(host.log().close_calls, 1);
    manager.unlock().await;
    assert_eq!(host.log().graphs_created, 2);
}

#[tokio::test(start_paused = true)]
async fn test_stale_in_flight_unlock_is_replaced() {
    let mut script = RecordingScript::default();
    script.initial_state = ContextState::Suspended;
    script.resume = ResumeBehavior::Hangs;
    let host = Rc::new(RecordingHost::with_tokio(script));
    let config = UnlockSection {
        attempt_timeout_ms: 60_000,
        resume_timeout_ms: 60_000,
        ..UnlockSection::default()
    };
    let manager = manager_with(&host, config);

    let (first, second) = futures::join!(manager.unlock(), manager.unlock());

    assert!(!first);
    assert!(!second);
    assert_eq!(manager.attempt_count(), 2);
    assert!(!manager.snapshot().unlock_in_flight);
}

#[tokio::test(start_paused = true)]
async fn test_test_tone_without_end_signal_only_warns() {
    let mut script = RecordingScript::default();
    script.voice_end = VoiceEnd::Never;
    let (_host, manager) = manager(script);

    let started = tokio::time::Instant::now();
    assert!(manager.unlock().await);
    assert!(started.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_no_audio_api_fails_without_panicking() {
    let (host, manager) = manager(RecordingScript::without_audio());

    assert!(!manager.unlock().await);
    assert!(matches!(
        manager.last_error(),
        Some(AudioError::NotSupported(_))
    ));
    assert!(manager.get_or_create_context().is_err());
    assert_eq!(host.log().graphs_created, 0);
}

#[tokio::test(start_paused = true)]
async fn test_close_allows_recreation_and_resets_budget() {
    let (host, manager) = manager(RecordingScript::default());

    assert!(manager.unlock().await);
    manager.close().await.unwrap();
    assert_eq!(manager.state(), ContextState::Uninstantiated);
    assert!(!manager.is_unlocked());
    assert_eq!(manager.attempt_count(), 0);

    assert!(manager.unlock().await);
    assert_eq!(host.log().graphs_created, 2);
}

#[tokio::test(start_paused = true)]
async fn test_handle_is_reused_until_closed() {
    let (host, manager) = manager(RecordingScript::default());

    manager.get_or_create_context().unwrap();
    manager.get_or_create_context().unwrap();
    assert_eq!(host.log().graphs_created, 1);

    host.latest_graph().unwrap().force_state(ContextState::Closed);
    manager.get_or_create_context().unwrap();
    assert_eq!(host.log().graphs_created, 2);
}

#[tokio::test(start_paused = true)]
async fn test_playback_resume_is_bounded() {
    let mut script = RecordingScript::default();
    script.initial_state = ContextState::Suspended;
    script.resume = ResumeBehavior::Hangs;
    let (_host, manager) = manager(script);

    let handle = manager.get_or_create_context().unwrap();
    let started = tokio::time::Instant::now();
    let result = manager.resume_for_playback(&handle).await;

    assert!(matches!(result, Err(AudioError::Timeout { bound_ms: 2_000, .. })));
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_reset_during_attempt_discards_its_outcome() {
    let mut script = RecordingScript::default();
    script.initial_state = ContextState::Suspended;
    script.resume = ResumeBehavior::Hangs;
    let (_host, manager) = manager(script);

    let reset = async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        manager.reset_unlock_state();
    };
    let (unlocked, ()) = futures::join!(manager.unlock(), reset);

    assert!(!unlocked);
    assert!(!manager.is_unlocked());
    assert_eq!(manager.attempt_count(), 0);
    assert!(manager.last_error().is_none());
    assert!(!manager.snapshot().unlock_in_flight);
}
