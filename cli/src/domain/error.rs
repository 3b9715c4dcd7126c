//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`, or
//! `crate::application`. All error types implement `thiserror::Error` and
//! convert to `anyhow::Error` via the `?` operator.
//!
//! Precondition violations the control surface renders specifically
//! (not-uploaded, already-running, ...) are NOT errors — they are typed
//! outcome enums returned in `Ok` by the orchestrator service.

use std::path::PathBuf;

use thiserror::Error;

// ── Remote repository errors ──────────────────────────────────────────────────

/// Errors from the backup/sync tool invocations behind `RemoteRepository`.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A required external tool binary is missing. Fatal to startup; the
    /// provisioning step is expected to place binaries before any
    /// repository operation runs.
    #[error("required tool not found: {0}. Run the binary provisioning step first.")]
    ToolNotFound(PathBuf),

    /// The underlying tool exited nonzero or produced unusable output.
    /// Carries the raw diagnostic text; callers decide whether to retry.
    #[error("{op} failed:\n{output}")]
    OperationFailed { op: &'static str, output: String },

    /// Local I/O around a tool invocation (scratch files, spawn) failed.
    #[error("i/o error during {op}")]
    Io {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },
}

// ── Process supervisor errors ─────────────────────────────────────────────────

/// Errors from the child-process supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// `start` was called twice on the same handle.
    #[error("process was already started on this handle")]
    AlreadyRunning,

    /// Input or wait was requested but no process is running.
    #[error("no process is running")]
    NotRunning,

    /// The OS refused to spawn the process (missing executable, permissions).
    #[error("failed to spawn '{command}'")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

// ── Client configuration errors ───────────────────────────────────────────────

/// Errors from `config set` key handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown configuration key '{key}'. Valid keys: {valid}")]
    UnknownKey { key: String, valid: &'static str },

    #[error("invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

// ── Server identity errors ────────────────────────────────────────────────────

/// Validation errors for server names used in remote paths.
#[derive(Debug, Error)]
pub enum ServerNameError {
    #[error("server name must not be empty")]
    Empty,

    #[error("invalid server name '{0}': only [a-z0-9_-] is allowed")]
    InvalidChars(String),
}
