//! Server registry service — the download-mutate-upload cycle around the
//! remote `servers.json`.
//!
//! There is no cross-host atomicity here: concurrent editors race and the
//! later write wins. Registry membership is advisory bookkeeping, not the
//! exclusion mechanism, so that is acceptable by design.

use anyhow::{Context, Result};

use crate::application::ports::{ProgressReporter, RemoteRepository};
use crate::domain::{paths, registry};

/// Outcome of `add_server`.
#[derive(Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// Outcome of `remove_server`.
#[derive(Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// All server names registered at the endpoint. Empty when the registry
/// file does not exist remotely yet.
pub async fn list_servers(
    repo: &impl RemoteRepository,
    reporter: &impl ProgressReporter,
) -> Result<Vec<String>> {
    load_registry(repo, reporter).await
}

/// Register a server name. Idempotent: a name that is already present is
/// left alone and nothing is re-uploaded.
pub async fn add_server(
    repo: &impl RemoteRepository,
    reporter: &impl ProgressReporter,
    name: &str,
) -> Result<AddOutcome> {
    let mut names = load_registry(repo, reporter).await?;
    if !registry::insert_name(&mut names, name) {
        return Ok(AddOutcome::AlreadyPresent);
    }
    save_registry(repo, &names).await?;
    Ok(AddOutcome::Added)
}

/// Deregister a server name. Absence is reported as a warning, not an
/// error, and the registry is re-uploaded either way.
pub async fn remove_server(
    repo: &impl RemoteRepository,
    reporter: &impl ProgressReporter,
    name: &str,
) -> Result<RemoveOutcome> {
    let mut names = load_registry(repo, reporter).await?;
    let found = registry::remove_name(&mut names, name);
    if !found {
        reporter.warn(&format!("'{name}' was not in the server registry"));
    }
    save_registry(repo, &names).await?;
    Ok(if found {
        RemoveOutcome::Removed
    } else {
        RemoveOutcome::NotFound
    })
}

async fn load_registry(
    repo: &impl RemoteRepository,
    reporter: &impl ProgressReporter,
) -> Result<Vec<String>> {
    match repo.fetch_text(&paths::registry_file()).await? {
        None => Ok(Vec::new()),
        Some(text) => match serde_json::from_str(&text) {
            Ok(names) => Ok(names),
            Err(err) => {
                // Malformed remote state: treat as absent rather than crash.
                reporter.warn(&format!(
                    "server registry is malformed ({err}); treating it as empty"
                ));
                Ok(Vec::new())
            }
        },
    }
}

async fn save_registry(repo: &impl RemoteRepository, names: &[String]) -> Result<()> {
    let text = serde_json::to_string_pretty(names).context("serializing server registry")?;
    repo.store_text(&paths::registry_file(), &text).await?;
    Ok(())
}
