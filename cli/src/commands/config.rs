//! `handoff config` - show or change local client configuration.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Subcommand;
use owo_colors::OwoColorize as _;

use crate::app::AppContext;
use crate::application::ports::ConfigStore as _;
use crate::domain::error::ConfigError;

const VALID_KEYS: &str = "endpoint, server, keep-hourly, keep-daily, keep-weekly";

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the current configuration
    Show,
    /// Set a configuration value
    Set {
        /// One of: endpoint, server, keep-hourly, keep-daily, keep-weekly
        key: String,
        value: String,
    },
}

pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => show(app),
        ConfigCommand::Set { key, value } => set(app, &key, &value),
    }
}

fn show(app: &AppContext) -> Result<ExitCode> {
    let config = app.config.load()?;
    let path = app.config.path()?;

    app.output.header("Client configuration");
    let dim = app.output.styles.dim;
    println!("    {}   {}", "client id".style(dim), config.client_id);
    println!("    {}    {}", "endpoint".style(dim), display(&config.endpoint));
    println!("    {}      {}", "server".style(dim), display(&config.server_name));
    println!(
        "    {}   hourly {} / daily {} / weekly {}",
        "retention".style(dim),
        config.retention.keep_hourly,
        config.retention.keep_daily,
        config.retention.keep_weekly,
    );
    println!("    {}        {}", "file".style(dim), path.display());
    Ok(ExitCode::SUCCESS)
}

fn set(app: &AppContext, key: &str, value: &str) -> Result<ExitCode> {
    let mut config = app.config.load()?;
    match key {
        "endpoint" => config.endpoint = value.to_owned(),
        "server" => config.server_name = value.to_owned(),
        "keep-hourly" => config.retention.keep_hourly = parse_count(key, value)?,
        "keep-daily" => config.retention.keep_daily = parse_count(key, value)?,
        "keep-weekly" => config.retention.keep_weekly = parse_count(key, value)?,
        _ => {
            return Err(ConfigError::UnknownKey {
                key: key.to_owned(),
                valid: VALID_KEYS,
            }
            .into());
        }
    }
    app.config.save(&config).context("saving configuration")?;
    app.output.success(&format!("{key} set to '{value}'"));
    Ok(ExitCode::SUCCESS)
}

fn parse_count(key: &str, value: &str) -> Result<u32> {
    value.parse().map_err(|_| {
        ConfigError::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
            reason: "expected a non-negative number".to_owned(),
        }
        .into()
    })
}

fn display(value: &str) -> &str {
    if value.is_empty() { "(not set)" } else { value }
}
