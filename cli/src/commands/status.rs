//! `handoff status` - who hosted a server last, and did they upload.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize as _;

use crate::app::AppContext;
use crate::application::ports::{ConfigStore as _, RemoteRepository as _};
use crate::domain::paths;
use crate::output::TerminalReporter;

#[derive(Args)]
pub struct StatusArgs {
    /// Server to inspect (defaults to the configured server)
    pub name: Option<String>,

    /// rclone endpoint the server lives at
    #[arg(long)]
    pub endpoint: Option<String>,
}

pub async fn run(app: &AppContext, args: StatusArgs) -> Result<ExitCode> {
    let endpoint = app.endpoint(args.endpoint)?;
    let server = app.server_name(args.name)?;
    let orchestrator = app.orchestrator(&endpoint, &server)?;
    let reporter = TerminalReporter::new(&app.output);

    app.output.header(&format!("Status of '{server}'"));
    let repo = app.repository(&endpoint)?;
    if !repo.repo_exists(&paths::server_repo(&server)).await? {
        app.output
            .warn("no snapshot repository found; was this server created?");
    }
    let Some(newest) = orchestrator.get_newest_host(&reporter).await? else {
        app.output.info("never hosted; ready for its first host");
        return Ok(ExitCode::SUCCESS);
    };

    let me = app.config.load()?.client_id;
    let who = if newest.client_id == me {
        "this client".to_owned()
    } else {
        format!("client {}", newest.client_id)
    };
    println!(
        "    last hosted by {} at {}",
        who.style(app.output.styles.bold),
        newest.time.format("%Y-%m-%d %H:%M:%S UTC"),
    );

    if orchestrator.did_newest_host_upload(&reporter).await? {
        app.output.success("data is uploaded; the server is ready to host");
    } else {
        app.output
            .warn("data has NOT been uploaded; only the holder can hand it off");
    }
    Ok(ExitCode::SUCCESS)
}
