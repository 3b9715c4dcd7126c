//! Remote layout of the coordination namespace.
//!
//! Everything a handoff deployment stores lives under one root folder on
//! the remote:
//!
//! ```text
//! /handoff/servers.json                   registry
//! /handoff/{server}/repo                  snapshot repository
//! /handoff/{server}/server_config.json    launch parameters
//! /handoff/{server}/host_history.json     hosting-lease ledger
//! ```

use anyhow::Result;

use crate::domain::error::ServerNameError;

/// Root namespace on the remote endpoint.
pub const REMOTE_ROOT: &str = "/handoff";

/// Remote path of the per-endpoint server registry file.
#[must_use]
pub fn registry_file() -> String {
    format!("{REMOTE_ROOT}/servers.json")
}

/// Remote folder holding everything belonging to one server.
#[must_use]
pub fn server_root(server: &str) -> String {
    format!("{REMOTE_ROOT}/{server}")
}

/// Remote path of a server's snapshot repository.
#[must_use]
pub fn server_repo(server: &str) -> String {
    format!("{REMOTE_ROOT}/{server}/repo")
}

/// Remote path of a server's launch configuration.
#[must_use]
pub fn server_config_file(server: &str) -> String {
    format!("{REMOTE_ROOT}/{server}/server_config.json")
}

/// Remote path of a server's host-history ledger.
#[must_use]
pub fn host_history_file(server: &str) -> String {
    format!("{REMOTE_ROOT}/{server}/host_history.json")
}

/// Validate a server name before it is spliced into remote paths.
///
/// # Errors
///
/// Returns an error for empty names or names containing anything outside
/// `[a-z0-9_-]` (uppercase included — remote backends differ in case
/// sensitivity, so names are lowercase by construction).
pub fn validate_server_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ServerNameError::Empty.into());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(ServerNameError::InvalidChars(name.to_owned()).into());
    }
    Ok(())
}
