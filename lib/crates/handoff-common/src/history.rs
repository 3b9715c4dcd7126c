use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of one hosting event.
///
/// An entry starts as `Hosting` when a client takes the lease and is flipped
/// to `Uploaded` exactly once, when that client (or an operator override)
/// confirms the server data was pushed back to the snapshot repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Hosting,
    Uploaded,
}

/// One hosting event in a server's append-only host-history ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostHistoryEntry {
    /// Identifier of the client that took the lease.
    pub client_id: String,
    /// When the lease was taken.
    pub time: DateTime<Utc>,
    pub status: HostStatus,
}

impl HostHistoryEntry {
    /// New `Hosting` entry for `client_id` stamped with the given time.
    #[must_use]
    pub fn hosting(client_id: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            client_id: client_id.into(),
            time,
            status: HostStatus::Hosting,
        }
    }
}
