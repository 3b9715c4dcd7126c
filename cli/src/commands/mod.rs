//! Command handlers, one module per subcommand.

pub mod config;
pub mod create;
pub mod delete;
pub mod endpoints;
pub mod list;
pub mod release;
pub mod run;
pub mod snapshots;
pub mod status;
