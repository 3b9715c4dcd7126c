//! `handoff list` - show servers registered at an endpoint.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize as _;

use crate::app::AppContext;
use crate::application::services::registry;
use crate::output::TerminalReporter;

#[derive(Args)]
pub struct ListArgs {
    /// rclone endpoint to list servers from
    #[arg(long)]
    pub endpoint: Option<String>,
}

pub async fn run(app: &AppContext, args: ListArgs) -> Result<ExitCode> {
    let endpoint = app.endpoint(args.endpoint)?;
    let repo = app.repository(&endpoint)?;
    let reporter = TerminalReporter::new(&app.output);

    let names = registry::list_servers(&repo, &reporter).await?;
    if names.is_empty() {
        app.output
            .info(&format!("no servers registered at '{endpoint}'"));
        return Ok(ExitCode::SUCCESS);
    }

    app.output.header(&format!("Servers at '{endpoint}'"));
    for name in names {
        println!("    {}", name.style(app.output.styles.bold));
    }
    Ok(ExitCode::SUCCESS)
}
