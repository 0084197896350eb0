use super::*;

#[test]
fn test_defaults_match_engine_constants() {
    let config = EngineConfig::default();
    assert_eq!(config.unlock.max_attempts, 5);
    assert_eq!(config.unlock.in_flight_timeout(), Duration::from_secs(10));
    assert_eq!(config.unlock.attempt_timeout(), Duration::from_secs(8));
    assert_eq!(config.unlock.resume_timeout(), Duration::from_secs(3));
    assert_eq!(config.unlock.playback_resume_timeout(), Duration::from_secs(2));
    assert_eq!(config.unlock.test_tone_timeout(), Duration::from_secs(2));
    assert_eq!(config.unlock.graph_options().sample_rate, 44_100);
    assert_eq!(config.clip.pool_size(), 3);
    assert_eq!(config.diagnostics.capacity(), 200);
    assert_eq!(config.progression.gap(), Duration::from_millis(1_500));
}

#[test]
fn test_partial_json_keeps_other_defaults() {
    let config = EngineConfig::from_json_str(
        r#"{ "unlock": { "max_attempts": 2, "aggressiveness": "aggressive" }, "diagnostics": { "verbosity": "quiet" } }"#,
    )
    .unwrap();

    assert_eq!(config.unlock.max_attempts, 2);
    assert_eq!(config.unlock.aggressiveness, Aggressiveness::Aggressive);
    assert_eq!(config.unlock.resume_timeout_ms, 3_000);
    assert_eq!(config.diagnostics.verbosity, Verbosity::Quiet);
    assert_eq!(config.live, LiveSection::default());
}

#[test]
fn test_clip_duration_is_clamped() {
    let mut clip = ClipSection::default();
    clip.duration_secs = 5.0;
    assert_eq!(clip.duration(), 2.0);
    clip.duration_secs = 0.2;
    assert_eq!(clip.duration(), 1.5);
}

#[test]
fn test_invalid_json_is_reported() {
    assert!(EngineConfig::from_json_str("{ not json").is_err());
}

#[cfg(feature = "cli")]
#[test]
fn test_load_prefers_toml_over_json() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("strumkit.json"),
        r#"{ "progression": { "gap_ms": 10 } }"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("strumkit.toml"),
        "[progression]\ngap_ms = 250\n\n[live]\nwaveform = \"sine\"\n",
    )
    .unwrap();

    let config = EngineConfig::load(dir.path()).unwrap();
    assert_eq!(config.progression.gap_ms, 250);
    assert_eq!(config.live.waveform, Waveform::Sine);
}

#[cfg(feature = "cli")]
#[test]
fn test_load_reads_json_when_alone() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("strumkit.json"),
        r#"{ "clip": { "pool_size": 5 } }"#,
    )
    .unwrap();

    let config = EngineConfig::load(dir.path()).unwrap();
    assert_eq!(config.clip.pool_size, 5);
}
