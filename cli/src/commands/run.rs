//! `handoff run` - host a server until Ctrl-C or the process exits, then
//! upload and hand the lease off.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::AppContext;
use crate::application::ports::ProgressFn;
use crate::application::services::orchestrator::{StartOutcome, StopOutcome};
use crate::infra::supervisor::OutputListener;
use crate::output::{TerminalReporter, progress};

#[derive(Args)]
pub struct RunArgs {
    /// Server to host (defaults to the configured server)
    pub name: Option<String>,

    /// rclone endpoint the server lives at
    #[arg(long)]
    pub endpoint: Option<String>,
}

pub async fn run(app: &AppContext, args: RunArgs) -> Result<ExitCode> {
    let endpoint = app.endpoint(args.endpoint)?;
    let server = app.server_name(args.name)?;
    let orchestrator = Arc::new(app.orchestrator(&endpoint, &server)?);
    let reporter = TerminalReporter::new(&app.output);

    app.output
        .header(&format!("Hosting '{server}' from '{endpoint}'"));

    let restore_bar = app
        .output
        .show_progress()
        .then(|| progress::transfer_bar("restoring snapshot"));
    let restore_sink = restore_bar.clone().map(progress::transfer_sink);
    let restore_progress = restore_sink.as_ref().map(|s| s as &ProgressFn);

    let listener = OutputListener::sync(|line| println!("{line}"));
    let outcome = orchestrator
        .start_server(&reporter, listener, restore_progress)
        .await;
    if let Some(bar) = restore_bar {
        bar.finish_and_clear();
    }
    match outcome? {
        StartOutcome::Started => {}
        StartOutcome::AlreadyRunning => {
            app.output.error("a server process is already running");
            return Ok(ExitCode::FAILURE);
        }
        StartOutcome::NotUploaded { holder } => {
            let holder = holder.unwrap_or_else(|| "unknown client".to_owned());
            app.output.error(&format!(
                "'{server}' was last hosted by {holder} and its data was never uploaded"
            ));
            app.output
                .info("ask that host to upload, or recover with 'handoff release'");
            return Ok(ExitCode::FAILURE);
        }
    }
    app.output
        .info("type server commands below; press Ctrl-C to stop and hand off");

    // Anything typed while hosting goes to the server console.
    let stdin_task = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if orchestrator.send_input(&line).is_err() {
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            app.output.info("interrupt received, shutting down");
        }
        _ = orchestrator.wait_until_done() => {
            app.output.warn("server process exited on its own");
        }
    }
    stdin_task.abort();

    let backup_bar = app
        .output
        .show_progress()
        .then(|| progress::transfer_bar("uploading snapshot"));
    let backup_sink = backup_bar.clone().map(progress::transfer_sink);
    let backup_progress = backup_sink.as_ref().map(|s| s as &ProgressFn);

    let outcome = orchestrator
        .stop_server(&reporter, backup_progress, None)
        .await;
    if let Some(bar) = backup_bar {
        bar.finish_and_clear();
    }
    match outcome? {
        StopOutcome::Stopped => Ok(ExitCode::SUCCESS),
        StopOutcome::NotRunning => {
            app.output.warn("nothing was running and no lease was held");
            Ok(ExitCode::SUCCESS)
        }
    }
}
