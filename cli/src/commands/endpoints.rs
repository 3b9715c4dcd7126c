//! `handoff endpoints` - list remotes defined in rclone.conf.

use std::process::ExitCode;

use anyhow::Result;
use owo_colors::OwoColorize as _;

use crate::app::AppContext;
use crate::infra::tools;

pub fn run(app: &AppContext) -> Result<ExitCode> {
    let conf = app.rclone_conf()?;
    if !conf.exists() {
        app.output
            .warn(&format!("no rclone configuration at {}", conf.display()));
        return Ok(ExitCode::SUCCESS);
    }

    let endpoints = tools::list_endpoints(&conf)?;
    if endpoints.is_empty() {
        app.output.info("no endpoints defined");
        return Ok(ExitCode::SUCCESS);
    }

    app.output.header("Configured endpoints");
    for name in endpoints {
        println!("    {}", name.style(app.output.styles.bold));
    }
    Ok(ExitCode::SUCCESS)
}
