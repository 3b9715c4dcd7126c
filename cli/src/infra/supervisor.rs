//! Child-process supervision for long-running server processes.
//!
//! One `ProcessSupervisor` owns one OS child. stdout and stderr are merged
//! into a single line stream and dispatched to a dynamic set of listeners;
//! stdin goes through a dedicated writer task so concurrent `send_input`
//! callers can never interleave partial lines.
//!
//! Reading child output and writing child input are the two genuinely
//! blocking activities in this crate; both run on their own tokio tasks so
//! application code stays responsive. Listener callbacks never run on the
//! raw read path either — lines hop through an mpsc channel to a single
//! dispatcher task, which is the only place listeners are invoked. That
//! keeps dispatch order identical to emission order even for asynchronous
//! listeners (their futures are spawned fire-and-forget, in order, and a
//! slow one cannot stall delivery to the rest).

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot, watch};

use crate::domain::error::SupervisorError;

/// Subscriber invoked once per completed output line, in arrival order.
///
/// `Async` listeners are spawned fire-and-forget: their completion is not
/// awaited before the next line is dispatched, but the spawn itself happens
/// in order on the dispatcher task.
pub enum OutputListener {
    Sync(Box<dyn Fn(&str) + Send + Sync>),
    Async(Box<dyn Fn(String) -> BoxFuture<'static, ()> + Send + Sync>),
}

impl OutputListener {
    /// Synchronous listener from a plain closure.
    pub fn sync(f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self::Sync(Box::new(f))
    }

    /// Asynchronous listener from a future-returning closure.
    pub fn asynchronous(
        f: impl Fn(String) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    ) -> Self {
        Self::Async(Box::new(f))
    }
}

/// Captured result of a one-shot command run.
#[derive(Debug)]
pub struct CapturedOutput {
    pub status: ExitStatus,
    /// Combined stdout + stderr, lossily decoded.
    pub output: String,
}

struct Running {
    stdin_tx: mpsc::UnboundedSender<String>,
    kill_tx: Option<oneshot::Sender<()>>,
    exit_rx: watch::Receiver<Option<ExitStatus>>,
}

enum HandleState {
    Idle,
    Started(Running),
}

/// Supervisor for exactly one child process.
///
/// `start` may be called once per handle; a finished handle stays finished.
pub struct ProcessSupervisor {
    listeners: Arc<Mutex<Vec<OutputListener>>>,
    transcript: Arc<Mutex<String>>,
    state: Mutex<HandleState>,
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSupervisor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
            transcript: Arc::new(Mutex::new(String::new())),
            state: Mutex::new(HandleState::Idle),
        }
    }

    /// Add a subscriber for future output lines. May be called before or
    /// after `start`; lines emitted before registration are not replayed
    /// (the full transcript is available via [`Self::total_output`]).
    pub fn register_listener(&self, listener: OutputListener) {
        lock(&self.listeners).push(listener);
    }

    /// Spawn the process. stdout and stderr are captured and merged.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::AlreadyRunning`] if this handle already spawned;
    /// [`SupervisorError::Spawn`] if the OS refuses (missing executable,
    /// permission denied).
    pub fn start(
        &self,
        command: &[String],
        env: &BTreeMap<String, String>,
        cwd: Option<&Path>,
    ) -> Result<(), SupervisorError> {
        let mut state = lock(&self.state);
        if matches!(*state, HandleState::Started(_)) {
            return Err(SupervisorError::AlreadyRunning);
        }
        let (program, args) = split_command(command)?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        let mut child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
            command: command.join(" "),
            source,
        })?;

        // Merged line stream: both readers feed one channel, one dispatcher
        // drains it. Listener invocation happens only on the dispatcher.
        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, line_tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, line_tx);
        }

        let listeners = Arc::clone(&self.listeners);
        let transcript = Arc::clone(&self.transcript);
        tokio::spawn(async move {
            while let Some(line) = line_rx.recv().await {
                {
                    let mut transcript = lock(&transcript);
                    transcript.push_str(&line);
                    transcript.push('\n');
                }
                for listener in lock(&listeners).iter() {
                    match listener {
                        OutputListener::Sync(f) => {
                            // One broken listener must not stop delivery to
                            // the others or terminate monitoring.
                            if catch_unwind(AssertUnwindSafe(|| f(&line))).is_err() {
                                eprintln!("warning: output listener panicked; line dropped for it");
                            }
                        }
                        OutputListener::Async(f) => {
                            tokio::spawn(f(line.clone()));
                        }
                    }
                }
            }
        });

        // Single-writer stdin queue: lines are delivered whole, in call order.
        let (stdin_tx, mut stdin_rx) = mpsc::unbounded_channel::<String>();
        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                while let Some(line) = stdin_rx.recv().await {
                    if stdin.write_all(line.as_bytes()).await.is_err() {
                        break;
                    }
                    if stdin.flush().await.is_err() {
                        break;
                    }
                }
            });
        }

        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();
        let (exit_tx, exit_rx) = watch::channel(None::<ExitStatus>);
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    let _ = exit_tx.send(status.ok());
                }
                _ = &mut kill_rx => {
                    let _ = child.kill().await;
                    let _ = exit_tx.send(child.wait().await.ok());
                }
            }
        });

        *state = HandleState::Started(Running {
            stdin_tx,
            kill_tx: Some(kill_tx),
            exit_rx,
        });
        Ok(())
    }

    /// Queue one newline-terminated line for the process's stdin.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::NotRunning`] when no process is running.
    pub fn send_input(&self, text: &str) -> Result<(), SupervisorError> {
        let state = lock(&self.state);
        let HandleState::Started(running) = &*state else {
            return Err(SupervisorError::NotRunning);
        };
        if running.exit_rx.borrow().is_some() {
            return Err(SupervisorError::NotRunning);
        }
        running
            .stdin_tx
            .send(format!("{text}\n"))
            .map_err(|_| SupervisorError::NotRunning)
    }

    /// Request termination and wait for exit. Idempotent: a handle that
    /// never started or already exited is a no-op.
    ///
    /// Vendor choice: this is a hard kill (tokio has no portable graceful
    /// signal). Graceful shutdown is the orchestrator's job via the
    /// configured stop command on stdin.
    pub async fn stop(&self) {
        let (kill_tx, exit_rx) = {
            let mut state = lock(&self.state);
            let HandleState::Started(running) = &mut *state else {
                return;
            };
            (running.kill_tx.take(), running.exit_rx.clone())
        };
        if let Some(tx) = kill_tx {
            let _ = tx.send(());
        }
        wait_for_exit(exit_rx).await;
    }

    /// Wait until the process exits on its own; never requests termination.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::NotRunning`] if the handle never started.
    pub async fn wait_until_done(&self) -> Result<(), SupervisorError> {
        let exit_rx = {
            let state = lock(&self.state);
            let HandleState::Started(running) = &*state else {
                return Err(SupervisorError::NotRunning);
            };
            running.exit_rx.clone()
        };
        wait_for_exit(exit_rx).await;
        Ok(())
    }

    /// Whether the process was started and has not exited yet.
    #[must_use]
    pub fn is_running(&self) -> bool {
        let state = lock(&self.state);
        match &*state {
            HandleState::Started(running) => running.exit_rx.borrow().is_none(),
            HandleState::Idle => false,
        }
    }

    /// Exit status, once the process has exited.
    #[must_use]
    pub fn exit_status(&self) -> Option<ExitStatus> {
        let state = lock(&self.state);
        match &*state {
            HandleState::Started(running) => *running.exit_rx.borrow(),
            HandleState::Idle => None,
        }
    }

    /// Everything the process has written so far, stdout and stderr merged.
    #[must_use]
    pub fn total_output(&self) -> String {
        lock(&self.transcript).clone()
    }

    /// Run a short-lived command to completion and capture its combined
    /// output. For one-shot external-tool invocations, never for the
    /// long-running server process.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::Spawn`] if the command cannot be spawned.
    pub async fn run_once(
        command: &[String],
        env: &BTreeMap<String, String>,
    ) -> Result<CapturedOutput, SupervisorError> {
        let (program, args) = split_command(command)?;
        let mut child = Command::new(program)
            .args(args)
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                command: command.join(" "),
                source,
            })?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();
        let (status, stdout, stderr) = tokio::join!(
            child.wait(),
            async {
                let mut buf = Vec::new();
                if let Some(ref mut h) = stdout_handle {
                    use tokio::io::AsyncReadExt;
                    let _ = h.read_to_end(&mut buf).await;
                }
                buf
            },
            async {
                let mut buf = Vec::new();
                if let Some(ref mut h) = stderr_handle {
                    use tokio::io::AsyncReadExt;
                    let _ = h.read_to_end(&mut buf).await;
                }
                buf
            },
        );
        let status = status.map_err(|source| SupervisorError::Spawn {
            command: command.join(" "),
            source,
        })?;

        let mut output = String::from_utf8_lossy(&stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&stderr));
        Ok(CapturedOutput { status, output })
    }
}

fn split_command(command: &[String]) -> Result<(&String, &[String]), SupervisorError> {
    match command.split_first() {
        Some((program, args)) => Ok((program, args)),
        None => Err(SupervisorError::Spawn {
            command: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line"),
        }),
    }
}

fn spawn_reader(stream: impl AsyncRead + Unpin + Send + 'static, tx: mpsc::UnboundedSender<String>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
}

async fn wait_for_exit(mut exit_rx: watch::Receiver<Option<ExitStatus>>) {
    loop {
        if exit_rx.borrow().is_some() {
            return;
        }
        if exit_rx.changed().await.is_err() {
            return;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
