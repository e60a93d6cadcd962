//! Warden CLI
//!
//! Configuration and capability-link administration.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use warden_cli::config_handlers::handle_config_command;
use warden_cli::token_handlers::handle_token_command;
use warden_cli::{Args, Command};
use warden_core::WardenConfig;

const DEFAULT_FILTER: &str = "info,warden=debug";

fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let loaded = WardenConfig::load(args.config.as_deref());
    init_logging(loaded.as_ref().ok().map(|c| c.logging.level.as_str()));
    tracing::debug!(command = ?args.command, "starting warden");

    match args.command {
        Command::Config { action } => {
            handle_config_command(args.config.as_deref(), action)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Token { action } => {
            let config = loaded?;
            Ok(handle_token_command(&config, action)?)
        }
    }
}
