use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn cli_status_prints_json() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut cmd = Command::cargo_bin("strumkit").expect("binary not found");
    cmd.args(["status", "--dry-run", "--config-dir"]).arg(dir.path());
    let output = cmd.assert().success().get_output().stdout.clone();

    let status: serde_json::Value = serde_json::from_slice(&output).expect("status is JSON");
    assert_eq!(status["backendMode"], "unresolved");
    assert_eq!(status["contextState"], "uninstantiated");
    assert_eq!(status["isUnlocked"], false);
    assert_eq!(status["liveStopSupported"], false);
}

#[test]
fn cli_play_dry_run_reports_scheduled_voices() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut cmd = Command::cargo_bin("strumkit").expect("binary not found");
    cmd.args(["play", "C4", "E4", "G4", "--strum", "--dry-run", "--config-dir"])
        .arg(dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("live-synthesis"))
        .stdout(predicate::str::contains("voices scheduled"));
}

#[test]
fn cli_play_clip_mode_dry_run() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut cmd = Command::cargo_bin("strumkit").expect("binary not found");
    cmd.args(["play", "G", "--mode", "clip", "--dry-run", "--config-dir"])
        .arg(dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("clips triggered: 1"));
}

#[test]
fn cli_play_requires_a_target() {
    let mut cmd = Command::cargo_bin("strumkit").expect("binary not found");
    cmd.args(["play", "--dry-run"]);
    cmd.assert().failure();
}
