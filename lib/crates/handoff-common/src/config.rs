use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Launch parameters for one managed server, stored remotely as
/// `server_config.json` next to the server's snapshot repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Start command used when the hosting client runs Windows.
    pub start_command_windows: String,
    /// Start command used when the hosting client runs Linux or another unix.
    pub start_command_linux: String,
    /// Line sent to the server's stdin to shut it down gracefully.
    /// Empty means the process is force-killed instead.
    pub stop_command: String,
    /// Network port the server listens on (forwarded by the tunnel helper).
    pub forward_port: u16,
    /// Extra environment variables for the server process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Optional catalog of named admin commands (label -> stdin line),
    /// surfaced by control UIs. Absent in older config files.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub commands: BTreeMap<String, String>,
}

/// This client's identity and defaults, persisted locally as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Stable identifier stamped onto hosting events.
    pub client_id: String,
    /// Default rclone endpoint (a section name in rclone.conf).
    #[serde(default)]
    pub endpoint: String,
    /// Default server name for commands that omit one.
    #[serde(default)]
    pub server_name: String,
    /// Snapshot retention applied after each upload.
    #[serde(default)]
    pub retention: RetentionPolicy,
}

/// Snapshot retention policy applied by `prune`. All-zero means
/// pruning is skipped entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    #[serde(default)]
    pub keep_hourly: u32,
    #[serde(default)]
    pub keep_daily: u32,
    #[serde(default)]
    pub keep_weekly: u32,
}

impl RetentionPolicy {
    /// True when no retention rule is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keep_hourly == 0 && self.keep_daily == 0 && self.keep_weekly == 0
    }
}
