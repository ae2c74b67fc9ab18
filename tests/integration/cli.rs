//! Integration tests for the `devtools-ext` binary
//!
//! Each test points the binary at its own temporary data directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn devtools(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("devtools-ext").expect("binary should build");
    cmd.arg("--data-dir").arg(data_dir.path());
    cmd
}

#[test]
fn test_show_before_anything_is_saved() {
    let dir = TempDir::new().unwrap();

    devtools(&dir)
        .args(["state", "show"])
        .assert()
        .success()
        .stdout(predicate::str::diff("null\n"));

    // First run writes the example config and opens the log file
    assert!(dir.path().join("config.toml").exists());
    assert!(dir.path().join("logs").join("devtools-ext.log").exists());
}

#[test]
fn test_set_then_show() {
    let dir = TempDir::new().unwrap();

    devtools(&dir)
        .args(["state", "set", "json-beautifier", r#"{"indent": 4}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"indent\": 4"))
        .stdout(predicate::str::contains("\"sortKeys\": false"));

    devtools(&dir)
        .args(["state", "select", "json-beautifier"])
        .assert()
        .success();

    devtools(&dir)
        .args(["state", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"toolStates\""))
        .stdout(predicate::str::contains("\"lastSelectedTool\": \"json-beautifier\""))
        .stdout(predicate::str::contains("\"indent\": 4"));
}

#[test]
fn test_set_rejects_non_object() {
    let dir = TempDir::new().unwrap();

    devtools(&dir)
        .args(["state", "set", "screenshot", "[1, 2]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a JSON object"));

    devtools(&dir)
        .args(["state", "set", "screenshot", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("valid JSON"));
}

#[test]
fn test_reset_tool_and_clear() {
    let dir = TempDir::new().unwrap();

    devtools(&dir)
        .args(["state", "set", "url-encoder", r#"{"mode": "decode"}"#])
        .assert()
        .success();

    devtools(&dir)
        .args(["state", "reset", "--tool", "url-encoder"])
        .assert()
        .success();
    devtools(&dir)
        .args(["state", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mode\": \"encode\""));

    devtools(&dir)
        .args(["state", "reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cleared"));
    devtools(&dir)
        .args(["state", "show"])
        .assert()
        .success()
        .stdout(predicate::str::diff("null\n"));
}

#[test]
fn test_overlay_demo_attaches_after_body_appears() {
    let dir = TempDir::new().unwrap();

    devtools(&dir)
        .args(["overlay-demo", "--body-delay-ms", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("presented while loading (attached: false)"))
        .stdout(predicate::str::contains("body ready (attached: true)"))
        .stdout(predicate::str::contains("devtools-extension-popup"))
        .stdout(predicate::str::contains("-- overlay closed"));
}
