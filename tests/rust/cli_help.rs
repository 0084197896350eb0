use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn cli_prints_help() {
    let mut cmd = Command::cargo_bin("strumkit").expect("binary not found");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("strumkit"))
        .stdout(predicate::str::contains("progression"))
        .stdout(predicate::str::contains("diagnostics"));
}
