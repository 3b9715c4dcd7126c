//! `handoff snapshots` - list snapshots stored for a server.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize as _;

use crate::app::AppContext;
use crate::application::ports::RemoteRepository as _;
use crate::domain::paths;

#[derive(Args)]
pub struct SnapshotsArgs {
    /// Server to inspect (defaults to the configured server)
    pub name: Option<String>,

    /// rclone endpoint the server lives at
    #[arg(long)]
    pub endpoint: Option<String>,
}

pub async fn run(app: &AppContext, args: SnapshotsArgs) -> Result<ExitCode> {
    let endpoint = app.endpoint(args.endpoint)?;
    let server = app.server_name(args.name)?;
    let repo = app.repository(&endpoint)?;

    let snapshots = repo.list_snapshots(&paths::server_repo(&server)).await?;
    if snapshots.is_empty() {
        app.output.info(&format!("no snapshots stored for '{server}'"));
        return Ok(ExitCode::SUCCESS);
    }

    app.output.header(&format!("Snapshots of '{server}'"));
    for snapshot in snapshots {
        let id = snapshot.short_id.as_deref().unwrap_or(&snapshot.id);
        let host = snapshot.hostname.as_deref().unwrap_or("unknown host");
        let paths = snapshot.paths.join(", ");
        println!(
            "    {}  {}  {}  ({})",
            id.style(app.output.styles.bold),
            snapshot.time.format("%Y-%m-%d %H:%M:%S UTC"),
            paths,
            host.style(app.output.styles.dim),
        );
    }
    Ok(ExitCode::SUCCESS)
}
