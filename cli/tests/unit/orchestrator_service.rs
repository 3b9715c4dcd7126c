//! End-to-end orchestrator behavior with a real child process and the
//! in-memory remote. Covers the two-client handoff cycle.

#![cfg(unix)]

use std::collections::BTreeMap;

use handoff_cli::application::services::orchestrator::{
    CreateOutcome, ServerOrchestrator, StartOutcome, StopOutcome,
};
use handoff_cli::infra::supervisor::OutputListener;
use handoff_common::ServerConfig;
use tempfile::TempDir;

use crate::mocks::{MemoryConfigStore, MockRepository, RecordingReporter};

// `cat` blocks on stdin forever, which stands in for a long-running
// server process. Empty stop command means force-kill on stop.
fn test_server_config() -> ServerConfig {
    ServerConfig {
        start_command_windows: String::new(),
        start_command_linux: "cat".to_owned(),
        stop_command: String::new(),
        forward_port: 25565,
        env: BTreeMap::new(),
        commands: BTreeMap::new(),
    }
}

fn orchestrator(
    repo: &MockRepository,
    client_id: &str,
    dir: &TempDir,
) -> ServerOrchestrator<MockRepository, MemoryConfigStore> {
    ServerOrchestrator::new(
        repo.clone(),
        MemoryConfigStore::with_client_id(client_id),
        "survival",
        dir.path().to_path_buf(),
    )
}

#[tokio::test]
async fn create_is_rejected_for_an_existing_name() {
    let repo = MockRepository::new();
    let dir = TempDir::new().expect("tempdir");
    let reporter = RecordingReporter::new();
    let a = orchestrator(&repo, "client-a", &dir);
    let b = orchestrator(&repo, "client-b", &dir);

    let outcome = a
        .create_server(&reporter, &test_server_config())
        .await
        .expect("create");
    assert_eq!(outcome, CreateOutcome::Created);
    assert!(repo.calls().iter().any(|c| c == "init_repo /handoff/survival/repo"));

    let outcome = b
        .create_server(&reporter, &test_server_config())
        .await
        .expect("second create");
    assert_eq!(outcome, CreateOutcome::AlreadyExists);
}

#[tokio::test]
async fn create_rejects_invalid_names() {
    let repo = MockRepository::new();
    let dir = TempDir::new().expect("tempdir");
    let bad = ServerOrchestrator::new(
        repo.clone(),
        MemoryConfigStore::with_client_id("client-a"),
        "Bad Name",
        dir.path().to_path_buf(),
    );
    let reporter = RecordingReporter::new();
    assert!(
        bad.create_server(&reporter, &test_server_config())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn delete_rejects_names_that_escape_the_namespace() {
    let repo = MockRepository::new();
    let dir = TempDir::new().expect("tempdir");
    let bad = ServerOrchestrator::new(
        repo.clone(),
        MemoryConfigStore::with_client_id("client-a"),
        "../..",
        dir.path().to_path_buf(),
    );
    let reporter = RecordingReporter::new();

    assert!(bad.delete_server(&reporter).await.is_err());
    assert!(
        repo.calls().is_empty(),
        "no remote operation may run for an invalid name"
    );
}

#[tokio::test]
async fn server_config_round_trips_through_the_remote() {
    let repo = MockRepository::new();
    let dir = TempDir::new().expect("tempdir");
    let reporter = RecordingReporter::new();
    let a = orchestrator(&repo, "client-a", &dir);
    a.create_server(&reporter, &test_server_config())
        .await
        .expect("create");

    let config = a.get_server_config().await.expect("fetch config");
    assert_eq!(config, test_server_config());

    let mut updated = config;
    updated.stop_command = "stop".to_owned();
    a.update_server_config(&updated).await.expect("update");
    assert_eq!(a.get_server_config().await.expect("refetch"), updated);
}

#[tokio::test]
async fn handoff_cycle_between_two_clients() {
    let repo = MockRepository::new();
    let dir = TempDir::new().expect("tempdir");
    let reporter = RecordingReporter::new();
    let a = orchestrator(&repo, "client-a", &dir);
    let b = orchestrator(&repo, "client-b", &dir);
    a.create_server(&reporter, &test_server_config())
        .await
        .expect("create");

    // A takes the lease and runs.
    let outcome = a
        .start_server(&reporter, OutputListener::sync(|_| {}), None)
        .await
        .expect("start a");
    assert_eq!(outcome, StartOutcome::Started);
    assert!(a.process_exists());
    assert!(a.is_client_newest_host(&reporter).await.expect("holder query"));

    // B is refused while A's data is not uploaded.
    let outcome = b
        .start_server(&reporter, OutputListener::sync(|_| {}), None)
        .await
        .expect("start b");
    assert_eq!(
        outcome,
        StartOutcome::NotUploaded {
            holder: Some("client-a".to_owned())
        }
    );

    // A cannot start twice.
    let outcome = a
        .start_server(&reporter, OutputListener::sync(|_| {}), None)
        .await
        .expect("restart a");
    assert_eq!(outcome, StartOutcome::AlreadyRunning);

    // A stops: upload, release.
    let outcome = a.stop_server(&reporter, None, None).await.expect("stop a");
    assert_eq!(outcome, StopOutcome::Stopped);
    assert!(!a.process_exists());
    assert!(a.did_newest_host_upload(&reporter).await.expect("upload query"));
    assert!(
        repo.calls()
            .iter()
            .any(|c| c.starts_with("backup") && c.ends_with("/handoff/survival/repo"))
    );

    // Now B can host.
    let outcome = b
        .start_server(&reporter, OutputListener::sync(|_| {}), None)
        .await
        .expect("start b again");
    assert_eq!(outcome, StartOutcome::Started);
    let newest = b
        .get_newest_host(&reporter)
        .await
        .expect("newest host")
        .expect("entry exists");
    assert_eq!(newest.client_id, "client-b");

    let outcome = b.stop_server(&reporter, None, None).await.expect("stop b");
    assert_eq!(outcome, StopOutcome::Stopped);
}

#[tokio::test]
async fn failed_upload_keeps_the_lease_and_stop_can_be_retried() {
    let repo = MockRepository::new();
    let dir = TempDir::new().expect("tempdir");
    let reporter = RecordingReporter::new();
    let a = orchestrator(&repo, "client-a", &dir);
    a.create_server(&reporter, &test_server_config())
        .await
        .expect("create");
    a.start_server(&reporter, OutputListener::sync(|_| {}), None)
        .await
        .expect("start");

    repo.fail_next_backups(true);
    assert!(a.stop_server(&reporter, None, None).await.is_err());
    assert!(
        a.is_client_newest_host(&reporter).await.expect("holder query"),
        "a failed upload must not release the lease"
    );

    // The process is gone but the lease is held: stop retries the upload.
    repo.fail_next_backups(false);
    let outcome = a.stop_server(&reporter, None, None).await.expect("retry");
    assert_eq!(outcome, StopOutcome::Stopped);
    assert!(a.did_newest_host_upload(&reporter).await.expect("upload query"));
}

#[tokio::test]
async fn stop_without_process_or_lease_reports_not_running() {
    let repo = MockRepository::new();
    let dir = TempDir::new().expect("tempdir");
    let reporter = RecordingReporter::new();
    let a = orchestrator(&repo, "client-a", &dir);
    a.create_server(&reporter, &test_server_config())
        .await
        .expect("create");

    let outcome = a.stop_server(&reporter, None, None).await.expect("stop");
    assert_eq!(outcome, StopOutcome::NotRunning);
}

#[tokio::test]
async fn delete_removes_remote_data_and_warns_when_unregistered() {
    let repo = MockRepository::new();
    let dir = TempDir::new().expect("tempdir");
    let reporter = RecordingReporter::new();
    let a = orchestrator(&repo, "client-a", &dir);
    a.create_server(&reporter, &test_server_config())
        .await
        .expect("create");

    a.delete_server(&reporter).await.expect("delete");
    assert!(repo.calls().iter().any(|c| c == "purge /handoff/survival"));
    assert_eq!(repo.file("/handoff/survival/server_config.json"), None);

    // Deleting again: remote wipe still runs, registry absence is a warning.
    a.delete_server(&reporter).await.expect("second delete");
    assert!(!reporter.warnings().is_empty());
}
