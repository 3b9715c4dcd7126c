//! Process supervisor behavior against real child processes.

#![cfg(unix)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::FutureExt as _;
use handoff_cli::domain::error::SupervisorError;
use handoff_cli::infra::supervisor::{OutputListener, ProcessSupervisor};

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_owned()).collect()
}

fn no_env() -> BTreeMap<String, String> {
    BTreeMap::new()
}

/// Poll until `cond` holds, failing the test after a few seconds.
async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 5s");
}

#[tokio::test]
async fn captures_merged_output_in_order() {
    let supervisor = ProcessSupervisor::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    supervisor.register_listener(OutputListener::sync({
        let seen = Arc::clone(&seen);
        move |line| seen.lock().expect("seen lock").push(line.to_owned())
    }));

    supervisor
        .start(&argv(&["sh", "-c", "printf 'one\\ntwo\\nthree\\n'"]), &no_env(), None)
        .expect("start");
    supervisor.wait_until_done().await.expect("wait");

    wait_until(|| seen.lock().expect("seen lock").len() == 3).await;
    assert_eq!(
        *seen.lock().expect("seen lock"),
        vec!["one".to_owned(), "two".to_owned(), "three".to_owned()]
    );
    assert!(supervisor.total_output().contains("two"));
}

#[tokio::test]
async fn every_registered_listener_sees_every_line() {
    let supervisor = ProcessSupervisor::new();
    let sync_a = Arc::new(Mutex::new(Vec::new()));
    let sync_b = Arc::new(Mutex::new(Vec::new()));
    let async_c = Arc::new(Mutex::new(Vec::new()));

    supervisor.register_listener(OutputListener::sync({
        let seen = Arc::clone(&sync_a);
        move |line| seen.lock().expect("lock").push(line.to_owned())
    }));
    supervisor.register_listener(OutputListener::sync({
        let seen = Arc::clone(&sync_b);
        move |line| seen.lock().expect("lock").push(line.to_owned())
    }));
    supervisor.register_listener(OutputListener::asynchronous({
        let seen = Arc::clone(&async_c);
        move |line| {
            let seen = Arc::clone(&seen);
            async move { seen.lock().expect("lock").push(line) }.boxed()
        }
    }));

    supervisor
        .start(&argv(&["sh", "-c", "echo alpha; echo beta"]), &no_env(), None)
        .expect("start");
    supervisor.wait_until_done().await.expect("wait");

    for seen in [&sync_a, &sync_b, &async_c] {
        let seen = Arc::clone(seen);
        wait_until(move || seen.lock().expect("lock").len() == 2).await;
    }
    assert_eq!(*sync_a.lock().expect("lock"), vec!["alpha", "beta"]);
    assert_eq!(*sync_b.lock().expect("lock"), vec!["alpha", "beta"]);
}

#[tokio::test]
async fn a_panicking_listener_does_not_stop_delivery_to_the_others() {
    let supervisor = ProcessSupervisor::new();
    supervisor.register_listener(OutputListener::sync(|_| panic!("listener blew up")));
    let seen = Arc::new(Mutex::new(Vec::new()));
    supervisor.register_listener(OutputListener::sync({
        let seen = Arc::clone(&seen);
        move |line| seen.lock().expect("seen lock").push(line.to_owned())
    }));

    supervisor
        .start(&argv(&["sh", "-c", "echo one; echo two; echo three"]), &no_env(), None)
        .expect("start");
    supervisor.wait_until_done().await.expect("wait");

    wait_until(|| seen.lock().expect("seen lock").len() == 3).await;
    assert_eq!(
        *seen.lock().expect("seen lock"),
        vec!["one".to_owned(), "two".to_owned(), "three".to_owned()]
    );
}

#[tokio::test]
async fn stderr_is_merged_into_the_stream() {
    let supervisor = ProcessSupervisor::new();
    supervisor
        .start(
            &argv(&["sh", "-c", "echo to-stdout; echo to-stderr 1>&2"]),
            &no_env(),
            None,
        )
        .expect("start");
    supervisor.wait_until_done().await.expect("wait");

    wait_until(|| {
        let out = supervisor.total_output();
        out.contains("to-stdout") && out.contains("to-stderr")
    })
    .await;
}

#[tokio::test]
async fn stdin_lines_reach_the_process() {
    let supervisor = ProcessSupervisor::new();
    supervisor
        .start(&argv(&["cat"]), &no_env(), None)
        .expect("start");

    supervisor.send_input("hello there").expect("send");
    wait_until(|| supervisor.total_output().contains("hello there")).await;

    supervisor.stop().await;
    assert!(!supervisor.is_running());
}

#[tokio::test]
async fn back_to_back_input_lines_stay_whole_and_ordered() {
    let supervisor = ProcessSupervisor::new();
    supervisor
        .start(&argv(&["cat"]), &no_env(), None)
        .expect("start");

    let sent: Vec<String> = (0..20).map(|i| format!("line-{i:02}")).collect();
    for line in &sent {
        supervisor.send_input(line).expect("send");
    }
    let expected = sent.len();
    wait_until(|| supervisor.total_output().lines().count() == expected).await;
    let echoed: Vec<String> = supervisor
        .total_output()
        .lines()
        .map(str::to_owned)
        .collect();
    assert_eq!(echoed, sent);
    supervisor.stop().await;
}

#[tokio::test]
async fn start_twice_is_rejected() {
    let supervisor = ProcessSupervisor::new();
    supervisor
        .start(&argv(&["cat"]), &no_env(), None)
        .expect("first start");
    let err = supervisor
        .start(&argv(&["cat"]), &no_env(), None)
        .expect_err("second start");
    assert!(matches!(err, SupervisorError::AlreadyRunning));
    supervisor.stop().await;
}

#[tokio::test]
async fn input_without_a_process_is_rejected() {
    let supervisor = ProcessSupervisor::new();
    let err = supervisor.send_input("anything").expect_err("no process");
    assert!(matches!(err, SupervisorError::NotRunning));
}

#[tokio::test]
async fn input_after_exit_is_rejected() {
    let supervisor = ProcessSupervisor::new();
    supervisor
        .start(&argv(&["true"]), &no_env(), None)
        .expect("start");
    supervisor.wait_until_done().await.expect("wait");

    let err = supervisor.send_input("too late").expect_err("exited");
    assert!(matches!(err, SupervisorError::NotRunning));
}

#[tokio::test]
async fn exit_status_is_observable_after_exit() {
    let supervisor = ProcessSupervisor::new();
    supervisor
        .start(&argv(&["sh", "-c", "exit 3"]), &no_env(), None)
        .expect("start");
    supervisor.wait_until_done().await.expect("wait");

    assert!(!supervisor.is_running());
    let status = supervisor.exit_status().expect("status recorded");
    assert_eq!(status.code(), Some(3));
}

#[tokio::test]
async fn stop_kills_a_stuck_process_and_is_idempotent() {
    let supervisor = ProcessSupervisor::new();
    supervisor
        .start(&argv(&["cat"]), &no_env(), None)
        .expect("start");
    assert!(supervisor.is_running());

    supervisor.stop().await;
    assert!(!supervisor.is_running());
    supervisor.stop().await;
}

#[tokio::test]
async fn run_once_captures_combined_output() {
    let captured = ProcessSupervisor::run_once(
        &argv(&["sh", "-c", "echo from-out; echo from-err 1>&2"]),
        &no_env(),
    )
    .await
    .expect("run");
    assert!(captured.status.success());
    assert!(captured.output.contains("from-out"));
    assert!(captured.output.contains("from-err"));
}

#[tokio::test]
async fn run_once_reports_spawn_failures() {
    let err = ProcessSupervisor::run_once(&argv(&["definitely-not-a-binary-xyz"]), &no_env())
        .await
        .expect_err("missing binary");
    assert!(matches!(err, SupervisorError::Spawn { .. }));
}
