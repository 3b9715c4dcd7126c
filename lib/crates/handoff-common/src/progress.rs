//! Structured events emitted by the backup tool's `--json` output.
//!
//! restic prints one JSON object per line; `message_type` discriminates.
//! Lines with an unknown `message_type` (or non-JSON chatter from rclone)
//! are skipped by [`ProgressEvent::parse`], not treated as errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One progress line from a running backup or restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Periodic progress update.
    Status {
        #[serde(default)]
        percent_done: f64,
        #[serde(default)]
        total_files: Option<u64>,
        #[serde(default)]
        files_done: Option<u64>,
        #[serde(default)]
        total_bytes: Option<u64>,
        #[serde(default)]
        bytes_done: Option<u64>,
    },
    /// Final summary after a successful backup.
    Summary {
        #[serde(default)]
        files_new: Option<u64>,
        #[serde(default)]
        files_changed: Option<u64>,
        #[serde(default)]
        total_files_processed: Option<u64>,
        #[serde(default)]
        total_bytes_processed: Option<u64>,
        #[serde(default)]
        snapshot_id: Option<String>,
    },
    /// Fatal error report; `code` 10 means the repository does not exist.
    ExitError { code: i32, message: String },
}

impl ProgressEvent {
    /// Parse one output line, returning `None` for anything that is not a
    /// recognized JSON progress message.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        serde_json::from_str(line.trim()).ok()
    }
}

/// Metadata of one snapshot in a repository, as reported by `snapshots --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    #[serde(default)]
    pub short_id: Option<String>,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub hostname: Option<String>,
}
