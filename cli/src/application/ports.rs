//! Port trait definitions for the application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `handoff-common` — never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use handoff_common::{ClientConfig, ProgressEvent, Snapshot};

use crate::domain::error::RepositoryError;

/// Sink for structured backup/restore progress events.
///
/// Borrowed for the duration of the operation; the repository calls it once
/// per recognized progress line, in emission order.
pub type ProgressFn = dyn Fn(ProgressEvent) + Send + Sync;

// ── Remote repository port ────────────────────────────────────────────────────

/// One `{endpoint, credentials}` binding to the remote store.
///
/// Snapshot operations (`backup`/`restore`) are serialized per instance —
/// at most one in flight at a time — because the underlying snapshot tool
/// cannot safely run two conflicting operations against the same repository
/// from one process. Plain-file operations and metadata queries are not
/// serialized against that lock. This is a process-local lock only; the
/// sole cluster-wide exclusion is the advisory hosting lease.
#[allow(async_fn_in_trait)]
pub trait RemoteRepository {
    /// Upload a directory tree as a new snapshot at `remote`.
    async fn backup(
        &self,
        local: &Path,
        remote: &str,
        progress: Option<&ProgressFn>,
    ) -> Result<(), RepositoryError>;

    /// Restore the named snapshot (`"latest"` for the most recent) from
    /// `remote` into `local`.
    async fn restore(
        &self,
        remote: &str,
        local: &Path,
        progress: Option<&ProgressFn>,
        snapshot: &str,
    ) -> Result<(), RepositoryError>;

    /// Mirror-sync a local file or directory to a remote folder. Not part
    /// of any snapshot repository; checksum-based, so re-syncing an
    /// unchanged file is a no-op.
    async fn upload_path(&self, local: &Path, remote: &str) -> Result<(), RepositoryError>;

    /// Mirror-sync a remote file or directory into a local folder.
    async fn download_path(&self, remote: &str, local: &Path) -> Result<(), RepositoryError>;

    /// Read a small remote coordination file as text. `Ok(None)` when the
    /// file does not exist remotely.
    async fn fetch_text(&self, remote: &str) -> Result<Option<String>, RepositoryError>;

    /// Write a small remote coordination file.
    async fn store_text(&self, remote: &str, contents: &str) -> Result<(), RepositoryError>;

    /// List snapshot metadata of the repository at `remote`.
    async fn list_snapshots(&self, remote: &str) -> Result<Vec<Snapshot>, RepositoryError>;

    /// Create a new (empty) snapshot repository at `remote`.
    async fn init_repo(&self, remote: &str) -> Result<(), RepositoryError>;

    /// Whether a snapshot repository exists at `remote`. A "repository not
    /// found" answer from the tool is `Ok(false)`, not an error.
    async fn repo_exists(&self, remote: &str) -> Result<bool, RepositoryError>;

    /// Apply the configured retention policy and drop unreferenced data.
    async fn prune_snapshots(&self, remote: &str) -> Result<(), RepositoryError>;

    /// Ensure a plain directory exists remotely (needed before `init_repo`).
    async fn create_remote_folder(&self, remote: &str) -> Result<(), RepositoryError>;

    /// Recursively delete a remote path and everything under it.
    async fn remove_remote_path(&self, remote: &str) -> Result<(), RepositoryError>;
}

// ── Client configuration port ─────────────────────────────────────────────────

/// Durable store for this client's identity and defaults.
pub trait ConfigStore {
    /// Load the config, creating and persisting a fresh identity on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or created.
    fn load(&self) -> Result<ClientConfig>;

    /// Persist the given config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    fn save(&self, config: &ClientConfig) -> Result<()>;

    /// Path of the backing file (for display).
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}

// ── Progress reporting port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

/// Reporter that drops everything — for callers that want silence.
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn step(&self, _message: &str) {}
    fn success(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}
