//! Host-history ledger — the pure state machine behind the hosting lease.
//!
//! The ledger is an append-only sequence of hosting events. The last entry's
//! status starts as `hosting` and may only flip to `uploaded`; a new
//! `hosting` entry may only be appended once the previous one is `uploaded`
//! (or the ledger is empty). Per server the lifecycle reads
//! `NoLease -> Hosting(a) -> Released -> Hosting(b) -> ...`.
//!
//! This is an advisory protocol: the remote store has no compare-and-swap,
//! so two clients racing through download-mutate-upload can both believe
//! they hold the lease. The window is minimized, not eliminated; deployments
//! needing strict exclusivity must layer a real lock service on top.

use chrono::{DateTime, Utc};
use handoff_common::{HostHistoryEntry, HostStatus};

/// In-memory snapshot of one server's host-history file.
///
/// All mutations are pure functions over this snapshot; the remote
/// fetch/store round trip is the caller's explicit boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostHistory {
    entries: Vec<HostHistoryEntry>,
}

impl HostHistory {
    #[must_use]
    pub fn new(entries: Vec<HostHistoryEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[HostHistoryEntry] {
        &self.entries
    }

    /// The newest hosting event, or `None` for a fresh server.
    #[must_use]
    pub fn current_holder(&self) -> Option<&HostHistoryEntry> {
        self.entries.last()
    }

    /// True when the ledger is empty or the newest host finished uploading.
    /// Only then may another client take the lease.
    #[must_use]
    pub fn has_been_released(&self) -> bool {
        self.entries
            .last()
            .is_none_or(|entry| entry.status == HostStatus::Uploaded)
    }

    /// True when `client_id` is the newest host and still holds the lease.
    #[must_use]
    pub fn is_held_by(&self, client_id: &str) -> bool {
        self.entries
            .last()
            .is_some_and(|entry| entry.client_id == client_id && entry.status == HostStatus::Hosting)
    }

    /// Append a `hosting` entry for `client_id` if the lease is free.
    ///
    /// Returns `false` (and appends nothing) when the newest entry is still
    /// `hosting` — including when `client_id` already holds it.
    pub fn acquire(&mut self, client_id: &str, now: DateTime<Utc>) -> bool {
        if !self.has_been_released() {
            return false;
        }
        self.entries.push(HostHistoryEntry::hosting(client_id, now));
        true
    }

    /// Flip the newest entry to `uploaded`, but only if `client_id` holds it.
    /// Returns whether anything changed.
    pub fn release(&mut self, client_id: &str) -> bool {
        if !self.is_held_by(client_id) {
            return false;
        }
        if let Some(entry) = self.entries.last_mut() {
            entry.status = HostStatus::Uploaded;
            return true;
        }
        false
    }

    /// Operator override: flip the newest entry to `uploaded` regardless of
    /// who holds it. No ownership check on purpose — this recovers from a
    /// crashed holder that never released. Returns whether anything changed.
    pub fn force_release(&mut self) -> bool {
        match self.entries.last_mut() {
            Some(entry) if entry.status == HostStatus::Hosting => {
                entry.status = HostStatus::Uploaded;
                true
            }
            _ => false,
        }
    }
}
