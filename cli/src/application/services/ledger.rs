//! Host-history ledger service — the remote round trip around the pure
//! lease state machine in `domain::ledger`.
//!
//! Every query and mutation is one download-mutate-upload cycle with no
//! cross-process locking; the lease stays advisory (see `domain::ledger`).

use anyhow::{Context, Result};
use chrono::Utc;
use handoff_common::HostHistoryEntry;

use crate::application::ports::{ProgressReporter, RemoteRepository};
use crate::domain::ledger::HostHistory;
use crate::domain::paths;

/// Download a server's ledger. A missing file initializes to an empty
/// ledger which is immediately persisted remotely; a malformed file is
/// treated as absent with a warning.
pub async fn load_history(
    repo: &impl RemoteRepository,
    reporter: &impl ProgressReporter,
    server: &str,
) -> Result<HostHistory> {
    match repo.fetch_text(&paths::host_history_file(server)).await? {
        None => {
            let empty = HostHistory::default();
            save_history(repo, server, &empty).await?;
            Ok(empty)
        }
        Some(text) => match serde_json::from_str::<Vec<HostHistoryEntry>>(&text) {
            Ok(entries) => Ok(HostHistory::new(entries)),
            Err(err) => {
                reporter.warn(&format!(
                    "host history for '{server}' is malformed ({err}); treating it as empty"
                ));
                Ok(HostHistory::default())
            }
        },
    }
}

/// Persist a ledger snapshot remotely.
pub async fn save_history(
    repo: &impl RemoteRepository,
    server: &str,
    history: &HostHistory,
) -> Result<()> {
    let text = serde_json::to_string_pretty(history.entries()).context("serializing host history")?;
    repo.store_text(&paths::host_history_file(server), &text)
        .await?;
    Ok(())
}

/// Take the lease for `client_id` if the newest host has uploaded.
/// Returns whether a new hosting entry was appended.
pub async fn acquire(
    repo: &impl RemoteRepository,
    reporter: &impl ProgressReporter,
    server: &str,
    client_id: &str,
) -> Result<bool> {
    let mut history = load_history(repo, reporter, server).await?;
    if !history.acquire(client_id, Utc::now()) {
        return Ok(false);
    }
    save_history(repo, server, &history).await?;
    Ok(true)
}

/// Mark the lease released, but only when `client_id` holds it.
pub async fn release(
    repo: &impl RemoteRepository,
    reporter: &impl ProgressReporter,
    server: &str,
    client_id: &str,
) -> Result<bool> {
    let mut history = load_history(repo, reporter, server).await?;
    if !history.release(client_id) {
        return Ok(false);
    }
    save_history(repo, server, &history).await?;
    Ok(true)
}

/// Operator override: mark the lease released no matter who holds it.
/// Used to recover from a crashed holder that never released.
pub async fn force_release(
    repo: &impl RemoteRepository,
    reporter: &impl ProgressReporter,
    server: &str,
) -> Result<bool> {
    let mut history = load_history(repo, reporter, server).await?;
    if !history.force_release() {
        return Ok(false);
    }
    save_history(repo, server, &history).await?;
    Ok(true)
}
