//! Sypher license manager
//!
//! Issues license keys and binds them to this device, using a local
//! license database. There is no license server.
//!
//! Usage:
//!   sypher issue
//!   sypher activate ABCD1234XXXXXXXX
//!   sypher status

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use sypher_cli::config::CliConfig;
use sypher_cli::{execute, open_manager, Command};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sypher")]
#[command(about = "Local license issuing and device activation")]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the license database and device state
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut config = CliConfig::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config = config.with_data_dir(dir);
    }
    debug!(?config, "resolved configuration");

    let manager = open_manager(&config)?;
    let output = execute(&manager, args.command).await?;
    print!("{output}");
    Ok(())
}
