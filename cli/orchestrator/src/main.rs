//! regtest-harness CLI
//!
//! Bootstraps a wallet, mines, and sends on a Bitcoin Core node, printing
//! each result as JSON on stdout.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

use anyhow::Context;
use clap::Parser;
use config::Config;
use harness_cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_overrides(&mut config.node)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    logging::try_init(level)?;

    let output = run(&cli, &config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
