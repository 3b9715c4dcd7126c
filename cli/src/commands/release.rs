//! `handoff release` - operator override for a stuck hosting lease.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::output::TerminalReporter;

#[derive(Args)]
pub struct ReleaseArgs {
    /// Server whose lease to release (defaults to the configured server)
    pub name: Option<String>,

    /// rclone endpoint the server lives at
    #[arg(long)]
    pub endpoint: Option<String>,
}

pub async fn run(app: &AppContext, args: ReleaseArgs) -> Result<ExitCode> {
    let endpoint = app.endpoint(args.endpoint)?;
    let server = app.server_name(args.name)?;
    let orchestrator = app.orchestrator(&endpoint, &server)?;
    let reporter = TerminalReporter::new(&app.output);

    app.output
        .warn("forcing the lease open discards the holder's un-uploaded progress");
    if orchestrator.force_release_host(&reporter).await? {
        app.output
            .success(&format!("lease for '{server}' released; the last upload wins"));
    } else {
        app.output.info(&format!("lease for '{server}' was not held"));
    }
    Ok(ExitCode::SUCCESS)
}
