//! Smoke tests for the CLI surface: help, version, argument errors.

use assert_cmd::Command;
use predicates::prelude::*;

fn handoff() -> Command {
    Command::cargo_bin("handoff").expect("binary built")
}

#[test]
fn no_arguments_prints_help_and_fails() {
    handoff()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_the_subcommands() {
    handoff()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("release"))
        .stdout(predicate::str::contains("endpoints"));
}

#[test]
fn version_flag_works() {
    handoff()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("handoff"));
}

#[test]
fn unknown_subcommand_is_rejected() {
    handoff()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn create_requires_a_start_command() {
    handoff()
        .args(["create", "survival"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--start-linux"));
}

#[test]
fn run_without_an_endpoint_fails_with_guidance() {
    let dir = tempfile::tempdir().expect("tempdir");
    handoff()
        .env("HANDOFF_CONFIG", dir.path().join("config.json"))
        .args(["run", "survival"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no endpoint selected"));
}

#[test]
fn list_without_provisioned_tools_reports_the_missing_binary() {
    let dir = tempfile::tempdir().expect("tempdir");
    handoff()
        .current_dir(dir.path())
        .env("HANDOFF_CONFIG", dir.path().join("config.json"))
        .args(["list", "--endpoint", "gdrive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required tool not found"));
}

#[test]
fn endpoints_without_rclone_conf_warns_and_succeeds() {
    let dir = tempfile::tempdir().expect("tempdir");
    handoff()
        .current_dir(dir.path())
        .env("HANDOFF_CONFIG", dir.path().join("config.json"))
        .arg("endpoints")
        .assert()
        .success()
        .stdout(predicate::str::contains("no rclone configuration"));
}
