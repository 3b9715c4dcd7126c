//! Handoff CLI - take turns hosting a game server backed by restic

use std::process::ExitCode;

use clap::Parser;

use handoff_cli::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
