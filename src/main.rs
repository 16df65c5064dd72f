//! Fantasy Manager - Main Entry Point
//!
//! Schedules a single roster transaction (add, drop, replace or waiver
//! claim) and drives it to completion at the target instant.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{error, info};

use fantasy_manager::cli::{execute, Cli};
use fantasy_manager::common::errors::{FantasyError, EXIT_ERROR, EXIT_NOT_PERMITTED, EXIT_SUCCESS};
use fantasy_manager::config::logging::init_logging;
use fantasy_manager::config::load_config;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let code = match run().await {
        Ok(message) => {
            println!("{}", message);
            EXIT_SUCCESS
        }
        Err(err) => {
            let code = exit_code(&err);
            error!(exit_code = code, "{:#}", err);
            if code == EXIT_NOT_PERMITTED {
                eprintln!("Not permitted: {:#}", err);
            } else {
                eprintln!("Error: {:#}", err);
            }
            code
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<String> {
    let cli = Cli::parse();

    let config = load_config(Some(&cli.config))
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;
    init_logging(&config.settings, cli.log_level.as_deref())?;

    info!("Starting fantasy-manager");
    info!("Configuration file: {}", cli.config);

    // Waits are sliced, so an interrupt lands within one slice
    tokio::select! {
        result = execute(cli.command, &config) => Ok(result?),
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt, abandoning pending transaction");
            Err(anyhow!("interrupted"))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<FantasyError>()
        .map(FantasyError::exit_code)
        .unwrap_or(EXIT_ERROR)
}
