//! restic/rclone implementation of the `RemoteRepository` port.
//!
//! Snapshot data goes through restic with an rclone backend
//! (`-r rclone:{endpoint}:{path}`); plain coordination files go through
//! rclone's checksum-based mirror sync. Every operation is an external
//! command invocation; diagnostics from the tools are carried verbatim in
//! `RepositoryError::OperationFailed`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use handoff_common::{ProgressEvent, RetentionPolicy, Snapshot};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::application::ports::{ProgressFn, RemoteRepository};
use crate::domain::error::{RepositoryError, SupervisorError};
use crate::infra::supervisor::{CapturedOutput, ProcessSupervisor};
use crate::infra::tools::ToolPaths;

/// restic exit code for "repository does not exist / is not initialized".
const EXIT_NO_REPOSITORY: i32 = 10;

/// One `{endpoint, rclone credentials}` binding. Stateless beyond its
/// configuration, apart from the in-process snapshot-operation lock.
pub struct ResticRepository {
    endpoint: String,
    tools: ToolPaths,
    retention: RetentionPolicy,
    /// Scratch directory for round-tripping small coordination files.
    scratch: PathBuf,
    /// Serializes `backup`/`restore` per instance. restic cannot safely run
    /// two conflicting operations against one repository from one process.
    snapshot_lock: Mutex<()>,
}

impl ResticRepository {
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        tools: ToolPaths,
        retention: RetentionPolicy,
        scratch: PathBuf,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            tools,
            retention,
            scratch,
            snapshot_lock: Mutex::new(()),
        }
    }

    fn env(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(
            "RCLONE_CONFIG".to_owned(),
            self.tools.rclone_conf.to_string_lossy().into_owned(),
        )])
    }

    /// Common restic invocation prefix for a repository at `remote`.
    fn restic_command(&self, remote: &str) -> Vec<String> {
        vec![
            self.tools.restic.to_string_lossy().into_owned(),
            "-r".to_owned(),
            format!("rclone:{}:{remote}", self.endpoint),
            "--insecure-no-password".to_owned(),
            "--option".to_owned(),
            format!("rclone.program={}", self.tools.rclone.display()),
            "--json".to_owned(),
        ]
    }

    fn rclone_command(&self) -> Vec<String> {
        vec![self.tools.rclone.to_string_lossy().into_owned()]
    }

    fn remote_spec(&self, remote: &str) -> String {
        format!("{}:{remote}", self.endpoint)
    }

    /// One-shot tool run; maps spawn failures to the repository taxonomy.
    async fn run_tool(
        &self,
        op: &'static str,
        command: &[String],
    ) -> Result<CapturedOutput, RepositoryError> {
        match ProcessSupervisor::run_once(command, &self.env()).await {
            Ok(output) => Ok(output),
            Err(SupervisorError::Spawn { command, source })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                let program = command.split_whitespace().next().unwrap_or_default();
                Err(RepositoryError::ToolNotFound(PathBuf::from(program)))
            }
            Err(err) => Err(RepositoryError::Io {
                op,
                source: std::io::Error::other(err),
            }),
        }
    }

    /// One-shot tool run that must exit zero.
    async fn run_tool_checked(
        &self,
        op: &'static str,
        command: &[String],
    ) -> Result<CapturedOutput, RepositoryError> {
        let captured = self.run_tool(op, command).await?;
        if captured.status.success() {
            Ok(captured)
        } else {
            Err(RepositoryError::OperationFailed {
                op,
                output: captured.output,
            })
        }
    }

    /// Long-running restic invocation with line-wise `--json` progress.
    async fn run_streaming(
        &self,
        op: &'static str,
        command: &[String],
        progress: Option<&ProgressFn>,
    ) -> Result<(), RepositoryError> {
        let Some((program, args)) = command.split_first() else {
            return Err(RepositoryError::Io {
                op,
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };
        let mut child = Command::new(program)
            .args(args)
            .envs(self.env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| map_spawn_error(op, program, source))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (status, out_text, err_text) = tokio::join!(
            child.wait(),
            read_lines(stdout, progress),
            read_lines(stderr, progress),
        );
        let status = status.map_err(|source| RepositoryError::Io { op, source })?;
        if status.success() {
            Ok(())
        } else {
            Err(RepositoryError::OperationFailed {
                op,
                output: format!("{out_text}{err_text}"),
            })
        }
    }
}

impl RemoteRepository for ResticRepository {
    async fn backup(
        &self,
        local: &Path,
        remote: &str,
        progress: Option<&ProgressFn>,
    ) -> Result<(), RepositoryError> {
        let _guard = self.snapshot_lock.lock().await;
        let mut command = self.restic_command(remote);
        command.push("backup".to_owned());
        command.push(local.to_string_lossy().into_owned());
        self.run_streaming("backup", &command, progress).await
    }

    async fn restore(
        &self,
        remote: &str,
        local: &Path,
        progress: Option<&ProgressFn>,
        snapshot: &str,
    ) -> Result<(), RepositoryError> {
        let _guard = self.snapshot_lock.lock().await;
        let mut command = self.restic_command(remote);
        command.extend([
            "restore".to_owned(),
            snapshot.to_owned(),
            "--target".to_owned(),
            local.to_string_lossy().into_owned(),
        ]);
        self.run_streaming("restore", &command, progress).await
    }

    async fn upload_path(&self, local: &Path, remote: &str) -> Result<(), RepositoryError> {
        let mut command = self.rclone_command();
        command.extend([
            "sync".to_owned(),
            "--checksum".to_owned(),
            "--size-only".to_owned(),
            "--no-update-modtime".to_owned(),
            local.to_string_lossy().into_owned(),
            self.remote_spec(remote),
        ]);
        self.run_tool_checked("upload", &command).await.map(|_| ())
    }

    async fn download_path(&self, remote: &str, local: &Path) -> Result<(), RepositoryError> {
        let mut command = self.rclone_command();
        command.extend([
            "sync".to_owned(),
            "--checksum".to_owned(),
            "--size-only".to_owned(),
            "--no-update-modtime".to_owned(),
            self.remote_spec(remote),
            local.to_string_lossy().into_owned(),
        ]);
        self.run_tool_checked("download", &command).await.map(|_| ())
    }

    async fn fetch_text(&self, remote: &str) -> Result<Option<String>, RepositoryError> {
        let file_name = remote_file_name(remote);
        let local = self.scratch.join(file_name);
        tokio::fs::create_dir_all(&self.scratch)
            .await
            .map_err(|source| RepositoryError::Io { op: "fetch", source })?;
        // Drop any stale copy so a failed sync cannot masquerade as current.
        let _ = tokio::fs::remove_file(&local).await;

        // A failed sync usually means "source not found" — the file has
        // never been uploaded. Absence is answered by the local check.
        match self.download_path(remote, &self.scratch).await {
            Ok(()) | Err(RepositoryError::OperationFailed { .. }) => {}
            Err(err) => return Err(err),
        }

        match tokio::fs::read_to_string(&local).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(RepositoryError::Io { op: "fetch", source }),
        }
    }

    async fn store_text(&self, remote: &str, contents: &str) -> Result<(), RepositoryError> {
        let file_name = remote_file_name(remote);
        let local = self.scratch.join(file_name);
        tokio::fs::create_dir_all(&self.scratch)
            .await
            .map_err(|source| RepositoryError::Io { op: "store", source })?;
        tokio::fs::write(&local, contents)
            .await
            .map_err(|source| RepositoryError::Io { op: "store", source })?;
        let remote_dir = remote.rsplit_once('/').map_or("/", |(dir, _)| dir);
        self.upload_path(&local, remote_dir).await
    }

    async fn list_snapshots(&self, remote: &str) -> Result<Vec<Snapshot>, RepositoryError> {
        let mut command = self.restic_command(remote);
        command.push("snapshots".to_owned());
        let captured = self.run_tool_checked("snapshots", &command).await?;
        // restic prints the listing as one JSON array line; stderr noise
        // from rclone may surround it in the merged transcript.
        captured
            .output
            .lines()
            .find_map(|line| serde_json::from_str::<Vec<Snapshot>>(line.trim()).ok())
            .ok_or(RepositoryError::OperationFailed {
                op: "snapshots",
                output: captured.output.clone(),
            })
    }

    async fn init_repo(&self, remote: &str) -> Result<(), RepositoryError> {
        let mut command = self.restic_command(remote);
        command.push("init".to_owned());
        self.run_tool_checked("init", &command).await.map(|_| ())
    }

    async fn repo_exists(&self, remote: &str) -> Result<bool, RepositoryError> {
        let mut command = self.restic_command(remote);
        command.push("snapshots".to_owned());
        let captured = self.run_tool("snapshots", &command).await?;
        if captured.status.success() {
            return Ok(true);
        }
        let reported_missing = captured.status.code() == Some(EXIT_NO_REPOSITORY)
            || captured.output.lines().any(|line| {
                matches!(
                    ProgressEvent::parse(line),
                    Some(ProgressEvent::ExitError { code, .. }) if code == EXIT_NO_REPOSITORY
                )
            });
        if reported_missing {
            Ok(false)
        } else {
            Err(RepositoryError::OperationFailed {
                op: "snapshots",
                output: captured.output,
            })
        }
    }

    async fn prune_snapshots(&self, remote: &str) -> Result<(), RepositoryError> {
        if self.retention.is_empty() {
            return Ok(());
        }
        let mut command = self.restic_command(remote);
        command.push("forget".to_owned());
        for (flag, count) in [
            ("--keep-hourly", self.retention.keep_hourly),
            ("--keep-daily", self.retention.keep_daily),
            ("--keep-weekly", self.retention.keep_weekly),
        ] {
            if count > 0 {
                command.push(flag.to_owned());
                command.push(count.to_string());
            }
        }
        command.push("--prune".to_owned());
        self.run_tool_checked("prune", &command).await.map(|_| ())
    }

    async fn create_remote_folder(&self, remote: &str) -> Result<(), RepositoryError> {
        let mut command = self.rclone_command();
        command.extend(["mkdir".to_owned(), self.remote_spec(remote)]);
        self.run_tool_checked("mkdir", &command).await.map(|_| ())
    }

    async fn remove_remote_path(&self, remote: &str) -> Result<(), RepositoryError> {
        let mut command = self.rclone_command();
        command.extend(["purge".to_owned(), self.remote_spec(remote)]);
        self.run_tool_checked("purge", &command).await.map(|_| ())
    }
}

fn map_spawn_error(op: &'static str, program: &str, source: std::io::Error) -> RepositoryError {
    if source.kind() == std::io::ErrorKind::NotFound {
        RepositoryError::ToolNotFound(PathBuf::from(program))
    } else {
        RepositoryError::Io { op, source }
    }
}

fn remote_file_name(remote: &str) -> &str {
    remote.rsplit('/').next().unwrap_or(remote)
}

async fn read_lines(
    stream: Option<impl AsyncRead + Unpin>,
    progress: Option<&ProgressFn>,
) -> String {
    let mut text = String::new();
    let Some(stream) = stream else {
        return text;
    };
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(sink) = progress
            && let Some(event) = ProgressEvent::parse(&line)
        {
            sink(event);
        }
        text.push_str(&line);
        text.push('\n');
    }
    text
}
