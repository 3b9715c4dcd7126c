//! Server orchestrator — composes lease, repository, and process
//! operations into the externally visible server lifecycle.
//!
//! One orchestrator instance manages one named server and holds at most
//! one running process at a time. Cross-component ordering ("restore
//! completes before start", "stop completes before backup") is enforced by
//! sequencing in this module, not by any global lock.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use handoff_common::{HostHistoryEntry, ServerConfig};

use crate::application::ports::{ConfigStore, ProgressFn, ProgressReporter, RemoteRepository};
use crate::application::services::{ledger, registry};
use crate::domain::error::SupervisorError;
use crate::domain::paths;
use crate::infra::supervisor::{OutputListener, ProcessSupervisor};

/// How long a delivered stop command gets before the process is killed.
/// Game servers flush their world state on shutdown, so this is generous.
const STOP_GRACE: Duration = Duration::from_secs(120);

/// Outcome of `create_server`.
#[derive(Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The name is already registered at this endpoint.
    AlreadyExists,
}

/// Outcome of `start_server`.
#[derive(Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Another host still holds the lease; its data was never uploaded.
    NotUploaded { holder: Option<String> },
    /// A process for this server is already running locally.
    AlreadyRunning,
}

/// Outcome of `stop_server`.
#[derive(Debug, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    /// Nothing was running and this client holds no lease to clean up.
    NotRunning,
}

/// Orchestrator for one named server at one endpoint.
pub struct ServerOrchestrator<R: RemoteRepository, C: ConfigStore> {
    repo: R,
    config: C,
    server_name: String,
    /// Local parent directory for working copies (`{servers_dir}/{name}`).
    servers_dir: PathBuf,
    supervisor: Mutex<Option<Arc<ProcessSupervisor>>>,
}

impl<R: RemoteRepository, C: ConfigStore> ServerOrchestrator<R, C> {
    pub fn new(repo: R, config: C, server_name: impl Into<String>, servers_dir: PathBuf) -> Self {
        Self {
            repo,
            config,
            server_name: server_name.into(),
            servers_dir,
            supervisor: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    fn work_dir(&self) -> PathBuf {
        self.servers_dir.join(&self.server_name)
    }

    fn current_supervisor(&self) -> Option<Arc<ProcessSupervisor>> {
        self.supervisor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_supervisor(&self, value: Option<Arc<ProcessSupervisor>>) {
        *self
            .supervisor
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = value;
    }

    // ── Creation and deletion ─────────────────────────────────────────────

    /// Create the managed server: remote folder, snapshot repository,
    /// initial config, registry entry.
    pub async fn create_server(
        &self,
        reporter: &impl ProgressReporter,
        server_config: &ServerConfig,
    ) -> Result<CreateOutcome> {
        paths::validate_server_name(&self.server_name)?;
        let names = registry::list_servers(&self.repo, reporter).await?;
        if names.iter().any(|n| n == &self.server_name) {
            return Ok(CreateOutcome::AlreadyExists);
        }

        let repo_path = paths::server_repo(&self.server_name);
        reporter.step("creating remote snapshot repository...");
        self.repo.create_remote_folder(&repo_path).await?;
        self.repo.init_repo(&repo_path).await?;

        reporter.step("uploading server configuration...");
        self.update_server_config(server_config).await?;

        registry::add_server(&self.repo, reporter, &self.server_name).await?;
        reporter.success("server created");
        Ok(CreateOutcome::Created)
    }

    /// Delete all remote data for this server and deregister the name.
    ///
    /// Orphaned data is removed even when the name is absent from the
    /// registry; that absence is only a warning.
    pub async fn delete_server(&self, reporter: &impl ProgressReporter) -> Result<()> {
        // A traversal name here would aim the recursive purge outside the
        // server's folder.
        paths::validate_server_name(&self.server_name)?;
        reporter.step("removing remote server data...");
        self.repo
            .remove_remote_path(&paths::server_root(&self.server_name))
            .await?;
        registry::remove_server(&self.repo, reporter, &self.server_name).await?;
        reporter.success("server deleted");
        Ok(())
    }

    // ── Server configuration ──────────────────────────────────────────────

    /// Download the launch configuration.
    pub async fn get_server_config(&self) -> Result<ServerConfig> {
        let remote = paths::server_config_file(&self.server_name);
        let text = self
            .repo
            .fetch_text(&remote)
            .await?
            .with_context(|| format!("no server configuration found for '{}'", self.server_name))?;
        serde_json::from_str(&text)
            .with_context(|| format!("server configuration for '{}' is malformed", self.server_name))
    }

    /// Replace the launch configuration.
    pub async fn update_server_config(&self, server_config: &ServerConfig) -> Result<()> {
        let text = serde_json::to_string_pretty(server_config)
            .context("serializing server configuration")?;
        self.repo
            .store_text(&paths::server_config_file(&self.server_name), &text)
            .await?;
        Ok(())
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Acquire the lease, pull the latest snapshot, and launch the server.
    ///
    /// Never spawns while another host's data is not uploaded. If anything
    /// fails after the lease was taken but before the process is up, the
    /// lease is handed back (nothing was changed locally yet).
    pub async fn start_server(
        &self,
        reporter: &impl ProgressReporter,
        listener: OutputListener,
        progress: Option<&ProgressFn>,
    ) -> Result<StartOutcome> {
        if self.process_exists() {
            return Ok(StartOutcome::AlreadyRunning);
        }
        let server_config = self.get_server_config().await?;
        let history = ledger::load_history(&self.repo, reporter, &self.server_name).await?;
        if !history.has_been_released() {
            return Ok(StartOutcome::NotUploaded {
                holder: history.current_holder().map(|e| e.client_id.clone()),
            });
        }

        let client_id = self.config.load()?.client_id;
        reporter.step("acquiring hosting lease...");
        if !ledger::acquire(&self.repo, reporter, &self.server_name, &client_id).await? {
            // Lost the race between the check and the append.
            let history = ledger::load_history(&self.repo, reporter, &self.server_name).await?;
            return Ok(StartOutcome::NotUploaded {
                holder: history.current_holder().map(|e| e.client_id.clone()),
            });
        }

        match self.restore_and_spawn(reporter, &server_config, listener, progress).await {
            Ok(()) => {
                reporter.success("server started");
                Ok(StartOutcome::Started)
            }
            Err(err) => {
                // Nothing ran, so nothing to upload: hand the lease back.
                if !ledger::release(&self.repo, reporter, &self.server_name, &client_id).await? {
                    reporter.warn("could not hand back the hosting lease after a failed start");
                }
                Err(err)
            }
        }
    }

    async fn restore_and_spawn(
        &self,
        reporter: &impl ProgressReporter,
        server_config: &ServerConfig,
        listener: OutputListener,
        progress: Option<&ProgressFn>,
    ) -> Result<()> {
        let work_dir = self.work_dir();
        tokio::fs::create_dir_all(&work_dir)
            .await
            .with_context(|| format!("creating {}", work_dir.display()))?;

        reporter.step("restoring latest snapshot...");
        self.repo
            .restore(
                &paths::server_repo(&self.server_name),
                &work_dir,
                progress,
                "latest",
            )
            .await?;

        let command_line = if cfg!(windows) {
            &server_config.start_command_windows
        } else {
            &server_config.start_command_linux
        };
        let command: Vec<String> = command_line.split_whitespace().map(str::to_owned).collect();

        reporter.step("launching server process...");
        let supervisor = Arc::new(ProcessSupervisor::new());
        supervisor.register_listener(listener);
        supervisor.start(&command, &server_config.env, Some(&work_dir))?;
        self.set_supervisor(Some(supervisor));
        Ok(())
    }

    /// Stop the server and hand the lease off: graceful stop command (or
    /// kill), backup, prune, release.
    ///
    /// Failures on the graceful path are logged and cleanup continues. A
    /// backup failure keeps the lease — the local working copy is then the
    /// only complete copy, and releasing would invite another host to
    /// restore stale data. Rerunning `stop_server` retries the upload even
    /// after the process is gone, as long as this client holds the lease.
    pub async fn stop_server(
        &self,
        reporter: &impl ProgressReporter,
        progress: Option<&ProgressFn>,
        on_event: Option<&(dyn Fn(&str) + Send + Sync)>,
    ) -> Result<StopOutcome> {
        let client_id = self.config.load()?.client_id;
        let supervisor = self.current_supervisor();
        if supervisor.is_none() {
            let history = ledger::load_history(&self.repo, reporter, &self.server_name).await?;
            if !history.is_held_by(&client_id) {
                return Ok(StopOutcome::NotRunning);
            }
            reporter.warn("no process is running but the lease is still held; retrying upload");
        }

        if let Some(supervisor) = supervisor {
            self.shut_down_process(reporter, &supervisor).await;
            self.set_supervisor(None);
        }

        let repo_path = paths::server_repo(&self.server_name);
        reporter.step("uploading server data...");
        self.repo
            .backup(&self.work_dir(), &repo_path, progress)
            .await?;

        if let Err(err) = self.repo.prune_snapshots(&repo_path).await {
            reporter.warn(&format!("pruning old snapshots failed: {err}"));
        }

        if !ledger::release(&self.repo, reporter, &self.server_name, &client_id).await? {
            reporter.warn("hosting lease was not held by this client; nothing to release");
        }

        if let Some(notify) = on_event {
            notify("server stopped");
        }
        reporter.success("server stopped and uploaded");
        Ok(StopOutcome::Stopped)
    }

    /// Graceful-then-forced shutdown. Every failure is a warning; the
    /// process is dead when this returns.
    async fn shut_down_process(
        &self,
        reporter: &impl ProgressReporter,
        supervisor: &ProcessSupervisor,
    ) {
        let stop_command = match self.get_server_config().await {
            Ok(config) => config.stop_command,
            Err(err) => {
                reporter.warn(&format!("cannot read server config ({err}); killing process"));
                String::new()
            }
        };

        if stop_command.is_empty() {
            reporter.step("stopping server process...");
            supervisor.stop().await;
            return;
        }

        reporter.step("sending stop command...");
        if let Err(err) = supervisor.send_input(&stop_command) {
            reporter.warn(&format!("stop command not delivered ({err}); killing process"));
            supervisor.stop().await;
            return;
        }
        if tokio::time::timeout(STOP_GRACE, supervisor.wait_until_done())
            .await
            .is_err()
        {
            reporter.warn("server did not exit within the grace period; killing process");
            supervisor.stop().await;
        }
    }

    // ── Ledger queries (operator tooling / UI status) ─────────────────────

    /// Newest hosting event, or `None` for a fresh server.
    pub async fn get_newest_host(
        &self,
        reporter: &impl ProgressReporter,
    ) -> Result<Option<HostHistoryEntry>> {
        let history = ledger::load_history(&self.repo, reporter, &self.server_name).await?;
        Ok(history.current_holder().cloned())
    }

    /// Whether the newest host has uploaded (or the ledger is empty).
    pub async fn did_newest_host_upload(&self, reporter: &impl ProgressReporter) -> Result<bool> {
        let history = ledger::load_history(&self.repo, reporter, &self.server_name).await?;
        Ok(history.has_been_released())
    }

    /// Whether this client is the newest host and still holds the lease.
    pub async fn is_client_newest_host(&self, reporter: &impl ProgressReporter) -> Result<bool> {
        let client_id = self.config.load()?.client_id;
        let history = ledger::load_history(&self.repo, reporter, &self.server_name).await?;
        Ok(history.is_held_by(&client_id))
    }

    /// Operator override: mark the lease released regardless of holder.
    pub async fn force_release_host(&self, reporter: &impl ProgressReporter) -> Result<bool> {
        ledger::force_release(&self.repo, reporter, &self.server_name).await
    }

    // ── Process pass-throughs ─────────────────────────────────────────────

    /// Queue one line for the running server's stdin.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::NotRunning`] when no process is active.
    pub fn send_input(&self, text: &str) -> Result<(), SupervisorError> {
        match self.current_supervisor() {
            Some(supervisor) => supervisor.send_input(text),
            None => Err(SupervisorError::NotRunning),
        }
    }

    /// Full merged transcript of the current (or last) process, if any.
    #[must_use]
    pub fn read_total_output(&self) -> Option<String> {
        self.current_supervisor().map(|s| s.total_output())
    }

    /// Whether a server process is running locally right now.
    #[must_use]
    pub fn process_exists(&self) -> bool {
        self.current_supervisor().is_some_and(|s| s.is_running())
    }

    /// Wait until the running process exits on its own.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::NotRunning`] when no process is active.
    pub async fn wait_until_done(&self) -> Result<(), SupervisorError> {
        match self.current_supervisor() {
            Some(supervisor) => supervisor.wait_until_done().await,
            None => Err(SupervisorError::NotRunning),
        }
    }
}
