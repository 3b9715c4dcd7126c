//! Discovery of the external tool binaries and the rclone configuration.
//!
//! A separate provisioning step is responsible for placing the `restic` and
//! `rclone` executables under `./bin/`; this module only locates and
//! verifies them. Missing binaries are a fatal `ToolNotFound`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

use crate::domain::error::RepositoryError;

/// Local paths of the two external tools and the rclone backend config.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub restic: PathBuf,
    pub rclone: PathBuf,
    /// Credential/endpoint mapping consumed via the `RCLONE_CONFIG` env var.
    pub rclone_conf: PathBuf,
}

impl ToolPaths {
    /// Locate the tools under `base` (`{base}/bin/restic/restic`,
    /// `{base}/bin/rclone/rclone`, `.exe` suffix on Windows) and the rclone
    /// config at `{base}/configs/rclone.conf`.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::ToolNotFound`] for the first missing binary. The
    /// config file is not required to exist yet (endpoint listing reports
    /// that separately).
    pub fn discover(base: &Path) -> Result<Self, RepositoryError> {
        let restic = base.join("bin").join("restic").join(binary_name("restic"));
        let rclone = base.join("bin").join("rclone").join(binary_name("rclone"));
        for path in [&restic, &rclone] {
            if !path.is_file() {
                return Err(RepositoryError::ToolNotFound(path.clone()));
            }
        }
        Ok(Self {
            restic,
            rclone,
            rclone_conf: base.join("configs").join("rclone.conf"),
        })
    }
}

fn binary_name(stem: &str) -> String {
    if cfg!(windows) {
        format!("{stem}.exe")
    } else {
        stem.to_owned()
    }
}

/// Names of the endpoints configured in the rclone config — its section
/// headers, in file order.
///
/// # Errors
///
/// Returns an error if the config file cannot be read; callers typically
/// downgrade that to a warning plus an empty listing.
pub fn list_endpoints(conf: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(conf)
        .with_context(|| format!("cannot read {}", conf.display()))?;
    let sections = Regex::new(r"\[([^\]]+)\]").context("compiling endpoint pattern")?;
    Ok(sections
        .captures_iter(&contents)
        .map(|c| c[1].to_owned())
        .collect())
}
