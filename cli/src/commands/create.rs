//! `handoff create` - register a server and initialize its remote repository.

use std::collections::BTreeMap;
use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::Args;
use handoff_common::ServerConfig;

use crate::app::AppContext;
use crate::application::services::orchestrator::CreateOutcome;
use crate::output::TerminalReporter;

#[derive(Args)]
pub struct CreateArgs {
    /// Server name (lowercase letters, digits, `-` and `_`)
    pub name: String,

    /// rclone endpoint to create the server at
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Command that launches the server on linux hosts
    #[arg(long, value_name = "CMD")]
    pub start_linux: String,

    /// Command that launches the server on windows hosts
    #[arg(long, value_name = "CMD", default_value = "")]
    pub start_windows: String,

    /// Line sent to the server's stdin to shut it down; omit to force-kill
    #[arg(long, value_name = "LINE", default_value = "")]
    pub stop_command: String,

    /// Port the server listens on
    #[arg(long, default_value_t = 25565)]
    pub port: u16,

    /// Extra environment variable for the server process (repeatable)
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,
}

pub async fn run(app: &AppContext, args: CreateArgs) -> Result<ExitCode> {
    let endpoint = app.endpoint(args.endpoint)?;
    let orchestrator = app.orchestrator(&endpoint, &args.name)?;
    let reporter = TerminalReporter::new(&app.output);

    let server_config = ServerConfig {
        start_command_windows: args.start_windows,
        start_command_linux: args.start_linux,
        stop_command: args.stop_command,
        forward_port: args.port,
        env: parse_env_pairs(&args.env)?,
        commands: BTreeMap::new(),
    };

    app.output
        .header(&format!("Creating server '{}' at '{endpoint}'", args.name));
    match orchestrator.create_server(&reporter, &server_config).await? {
        CreateOutcome::Created => Ok(ExitCode::SUCCESS),
        CreateOutcome::AlreadyExists => {
            app.output
                .error(&format!("server '{}' already exists at '{endpoint}'", args.name));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn parse_env_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("invalid --env '{pair}': expected KEY=VALUE");
        };
        env.insert(key.to_owned(), value.to_owned());
    }
    Ok(env)
}
