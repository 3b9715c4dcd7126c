//! CLI argument definitions and dispatch.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::AppContext;
use crate::commands;

/// Take turns hosting a shared game server backed by remote snapshots.
#[derive(Parser)]
#[command(name = "handoff", version, propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register a new server and initialize its remote repository
    Create(commands::create::CreateArgs),
    /// Delete a server's remote data and registry entry
    Delete(commands::delete::DeleteArgs),
    /// List servers registered at the endpoint
    List(commands::list::ListArgs),
    /// Host a server: acquire the lease, restore, run until stopped
    Run(commands::run::RunArgs),
    /// Show who hosted a server last and whether it was uploaded
    Status(commands::status::StatusArgs),
    /// Force-release a stuck hosting lease
    Release(commands::release::ReleaseArgs),
    /// List snapshots stored for a server
    Snapshots(commands::snapshots::SnapshotsArgs),
    /// List endpoints defined in the local rclone configuration
    Endpoints,
    /// Show or change local client configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

impl Cli {
    /// Dispatch the parsed command.
    pub async fn run(self) -> Result<ExitCode> {
        let app = AppContext::new(self.no_color, self.quiet);
        match self.command {
            Command::Create(args) => commands::create::run(&app, args).await,
            Command::Delete(args) => commands::delete::run(&app, args).await,
            Command::List(args) => commands::list::run(&app, args).await,
            Command::Run(args) => commands::run::run(&app, args).await,
            Command::Status(args) => commands::status::run(&app, args).await,
            Command::Release(args) => commands::release::run(&app, args).await,
            Command::Snapshots(args) => commands::snapshots::run(&app, args).await,
            Command::Endpoints => commands::endpoints::run(&app),
            Command::Config(cmd) => commands::config::run(&app, cmd),
        }
    }
}
