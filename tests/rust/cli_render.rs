use assert_cmd::Command;
use strumkit::utils::wav_parser::inspect_wav;

#[test]
fn cli_render_writes_a_playable_wav() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("clips").join("am.wav");

    let mut cmd = Command::cargo_bin("strumkit").expect("binary not found");
    cmd.args(["render", "Am", "--output"])
        .arg(&output)
        .arg("--config-dir")
        .arg(dir.path());
    cmd.assert().success();

    let bytes = std::fs::read(&output).expect("rendered file");
    let info = inspect_wav(&bytes).expect("valid wav");
    assert_eq!(info.channels, 1);
    assert_eq!(info.sample_rate, 44_100);
    assert_eq!(info.bits_per_sample, 16);
    assert!((info.duration_secs() - 1.5).abs() < 0.01);
}

#[test]
fn cli_render_rejects_unknown_chord() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut cmd = Command::cargo_bin("strumkit").expect("binary not found");
    cmd.args(["render", "H7", "--output"])
        .arg(dir.path().join("h7.wav"))
        .arg("--config-dir")
        .arg(dir.path());
    cmd.assert().failure();
    assert!(!dir.path().join("h7.wav").exists());
}
