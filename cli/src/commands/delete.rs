//! `handoff delete` - remove a server's remote data and registry entry.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::output::TerminalReporter;

#[derive(Args)]
pub struct DeleteArgs {
    /// Server to delete (defaults to the configured server)
    pub name: Option<String>,

    /// rclone endpoint the server lives at
    #[arg(long)]
    pub endpoint: Option<String>,
}

pub async fn run(app: &AppContext, args: DeleteArgs) -> Result<ExitCode> {
    let endpoint = app.endpoint(args.endpoint)?;
    let server = app.server_name(args.name)?;
    let orchestrator = app.orchestrator(&endpoint, &server)?;
    let reporter = TerminalReporter::new(&app.output);

    app.output
        .header(&format!("Deleting server '{server}' at '{endpoint}'"));
    app.output
        .warn("this removes every snapshot of the server from remote storage");
    orchestrator.delete_server(&reporter).await?;
    Ok(ExitCode::SUCCESS)
}
