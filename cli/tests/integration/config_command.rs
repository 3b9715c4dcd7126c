//! End-to-end tests for `handoff config` against a scratch config file.

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

fn handoff(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("handoff").expect("binary built");
    cmd.env("HANDOFF_CONFIG", config_dir.path().join("config.json"));
    cmd
}

#[test]
#[serial]
fn show_mints_a_client_identity_on_first_run() {
    let dir = TempDir::new().expect("tempdir");
    handoff(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("client id"))
        .stdout(predicate::str::contains("(not set)"));

    let written = std::fs::read_to_string(dir.path().join("config.json")).expect("config file");
    let parsed: serde_json::Value = serde_json::from_str(&written).expect("valid json");
    let id = parsed["client_id"].as_str().expect("client_id field");
    assert_eq!(id.len(), 30);
    assert!(id.chars().all(|c| c.is_ascii_digit()));
}

#[test]
#[serial]
fn set_and_show_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    handoff(&dir)
        .args(["config", "set", "endpoint", "gdrive"])
        .assert()
        .success();
    handoff(&dir)
        .args(["config", "set", "server", "survival"])
        .assert()
        .success();
    handoff(&dir)
        .args(["config", "set", "keep-daily", "7"])
        .assert()
        .success();

    handoff(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gdrive"))
        .stdout(predicate::str::contains("survival"))
        .stdout(predicate::str::contains("daily 7"));
}

#[test]
#[serial]
fn client_identity_survives_updates() {
    let dir = TempDir::new().expect("tempdir");
    handoff(&dir).args(["config", "show"]).assert().success();
    let before = std::fs::read_to_string(dir.path().join("config.json")).expect("config file");

    handoff(&dir)
        .args(["config", "set", "endpoint", "gdrive"])
        .assert()
        .success();
    let after = std::fs::read_to_string(dir.path().join("config.json")).expect("config file");

    let before: serde_json::Value = serde_json::from_str(&before).expect("json");
    let after: serde_json::Value = serde_json::from_str(&after).expect("json");
    assert_eq!(before["client_id"], after["client_id"]);
}

#[test]
#[serial]
fn unknown_key_is_rejected_with_the_valid_set() {
    let dir = TempDir::new().expect("tempdir");
    handoff(&dir)
        .args(["config", "set", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown configuration key"))
        .stderr(predicate::str::contains("endpoint"));
}

#[test]
#[serial]
fn non_numeric_retention_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    handoff(&dir)
        .args(["config", "set", "keep-daily", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
