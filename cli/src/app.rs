//! Application context wiring the infrastructure adapters together for
//! the command layer.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::application::ports::ConfigStore as _;
use crate::application::services::orchestrator::ServerOrchestrator;
use crate::domain::paths;
use crate::infra::config::JsonConfigStore;
use crate::infra::restic::ResticRepository;
use crate::infra::tools::ToolPaths;
use crate::output::OutputContext;

/// Shared state for one CLI invocation.
pub struct AppContext {
    pub output: OutputContext,
    pub config: JsonConfigStore,
}

impl AppContext {
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        Self {
            output: OutputContext::new(no_color, quiet),
            config: JsonConfigStore::new(),
        }
    }

    /// Directory all relative tool and data paths resolve against.
    fn base_dir() -> Result<PathBuf> {
        std::env::current_dir().context("resolving current directory")
    }

    /// Resolve the rclone endpoint: explicit flag first, then the
    /// configured default.
    pub fn endpoint(&self, flag: Option<String>) -> Result<String> {
        if let Some(endpoint) = flag
            && !endpoint.is_empty()
        {
            return Ok(endpoint);
        }
        let endpoint = self.config.load()?.endpoint;
        if endpoint.is_empty() {
            bail!(
                "no endpoint selected. Pass --endpoint or run 'handoff config set endpoint <name>'"
            );
        }
        Ok(endpoint)
    }

    /// Resolve the server name: explicit argument first, then the
    /// configured default.
    pub fn server_name(&self, arg: Option<String>) -> Result<String> {
        if let Some(name) = arg
            && !name.is_empty()
        {
            paths::validate_server_name(&name)?;
            return Ok(name);
        }
        let name = self.config.load()?.server_name;
        if name.is_empty() {
            bail!("no server selected. Pass a name or run 'handoff config set server <name>'");
        }
        paths::validate_server_name(&name)?;
        Ok(name)
    }

    /// Path to the rclone remote definitions.
    pub fn rclone_conf(&self) -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("configs").join("rclone.conf"))
    }

    /// Build the restic-backed remote repository for `endpoint`.
    pub fn repository(&self, endpoint: &str) -> Result<ResticRepository> {
        let base = Self::base_dir()?;
        let tools = ToolPaths::discover(&base)?;
        let retention = self.config.load()?.retention;
        Ok(ResticRepository::new(
            endpoint,
            tools,
            retention,
            base.join("cache"),
        ))
    }

    /// Build an orchestrator for one named server at `endpoint`.
    pub fn orchestrator(
        &self,
        endpoint: &str,
        server: &str,
    ) -> Result<ServerOrchestrator<ResticRepository, JsonConfigStore>> {
        let repo = self.repository(endpoint)?;
        Ok(ServerOrchestrator::new(
            repo,
            JsonConfigStore::new(),
            server,
            Self::base_dir()?.join("servers"),
        ))
    }
}
