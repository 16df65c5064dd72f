//! Command-line interface definitions and dispatch

use clap::{Args, Parser, Subcommand};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::info;

use crate::common::errors::{FantasyError, Result};
use crate::common::types::{PlayerId, TransactionRequest};
use crate::config::types::AppConfig;
use crate::controller::RosterController;
use crate::yahoo::YahooClient;

/// Fantasy Manager - timed roster transactions for fantasy hockey
#[derive(Parser, Debug)]
#[command(name = "fantasy-manager")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: String,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add, drop or replace a player at a scheduled time
    #[command(subcommand)]
    Roster(RosterCommand),

    /// Look up a player's name
    Player(PlayerArgs),
}

/// Subcommands for `fantasy-manager roster`
#[derive(Subcommand, Debug)]
pub enum RosterCommand {
    /// Add a free agent or place a waiver claim
    Add(AddArgs),
    /// Drop a player
    Drop(DropArgs),
    /// Add one player and drop another in a single transaction
    Replace(ReplaceArgs),
}

/// When the transaction runs
#[derive(Args, Debug, Clone, Default)]
pub struct TimingArgs {
    /// Start time (RFC 3339, or local `YYYY-MM-DD[THH:MM[:SS]]`); defaults to the next roster lock
    #[arg(long, conflicts_with = "now")]
    pub start: Option<String>,

    /// Run immediately (asks for confirmation)
    #[arg(long)]
    pub now: bool,
}

/// Waiver-claim options
#[derive(Args, Debug, Clone, Default)]
pub struct WaiverArgs {
    /// Place a waiver claim instead of a free-agent add
    #[arg(long)]
    pub waiver: bool,

    /// FAAB bid for the waiver claim
    #[arg(long, requires = "waiver")]
    pub faab: Option<u32>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// League name from the configuration
    #[arg(long)]
    pub league: String,

    /// Player id to add
    #[arg(long)]
    pub add: String,

    #[command(flatten)]
    pub waiver: WaiverArgs,

    #[command(flatten)]
    pub timing: TimingArgs,
}

#[derive(Args, Debug)]
pub struct DropArgs {
    /// League name from the configuration
    #[arg(long)]
    pub league: String,

    /// Player id to drop
    #[arg(long)]
    pub drop: String,

    #[command(flatten)]
    pub timing: TimingArgs,
}

#[derive(Args, Debug)]
pub struct ReplaceArgs {
    /// League name from the configuration
    #[arg(long)]
    pub league: String,

    /// Player id to add
    #[arg(long)]
    pub add: String,

    /// Player id to drop
    #[arg(long)]
    pub drop: String,

    #[command(flatten)]
    pub waiver: WaiverArgs,

    #[command(flatten)]
    pub timing: TimingArgs,
}

#[derive(Args, Debug)]
pub struct PlayerArgs {
    /// League name from the configuration
    #[arg(long)]
    pub league: String,

    /// Player id to look up
    #[arg(long)]
    pub id: String,
}

impl RosterCommand {
    pub fn league(&self) -> &str {
        match self {
            RosterCommand::Add(args) => &args.league,
            RosterCommand::Drop(args) => &args.league,
            RosterCommand::Replace(args) => &args.league,
        }
    }

    pub fn timing(&self) -> &TimingArgs {
        match self {
            RosterCommand::Add(args) => &args.timing,
            RosterCommand::Drop(args) => &args.timing,
            RosterCommand::Replace(args) => &args.timing,
        }
    }

    /// Build the transaction the command asks for
    pub fn request(&self) -> Result<TransactionRequest> {
        match self {
            RosterCommand::Add(args) => TransactionRequest::new(
                Some(PlayerId::new(&args.add)),
                None,
                args.waiver.waiver,
                args.waiver.faab,
            ),
            RosterCommand::Drop(args) => {
                TransactionRequest::new(None, Some(PlayerId::new(&args.drop)), false, None)
            }
            RosterCommand::Replace(args) => TransactionRequest::new(
                Some(PlayerId::new(&args.add)),
                Some(PlayerId::new(&args.drop)),
                args.waiver.waiver,
                args.waiver.faab,
            ),
        }
    }
}

/// Ask the operator to confirm an immediate run
///
/// Only `y` or `yes` (any case) proceeds; anything else, including end of
/// input, is `UserAbort`.
pub fn confirm_proceed<R: BufRead, W: Write>(mut reader: R, mut writer: W) -> Result<()> {
    write!(writer, "Continue? [ y | n ] ")
        .and_then(|_| writer.flush())
        .map_err(|e| FantasyError::Internal(format!("Failed to write prompt: {}", e)))?;

    let mut answer = String::new();
    reader
        .read_line(&mut answer)
        .map_err(|e| FantasyError::Input(format!("Failed to read answer: {}", e)))?;

    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Ok(()),
        _ => Err(FantasyError::UserAbort),
    }
}

/// Run a parsed command; returns the one-line result message
pub async fn execute(command: Commands, config: &AppConfig) -> Result<String> {
    match command {
        Commands::Roster(roster) => run_roster(roster, config).await,
        Commands::Player(args) => {
            let controller = controller_for(&args.league, config)?;
            let player = PlayerId::new(&args.id);
            let name = controller.player_name(&player).await?;
            Ok(format!("Player {}: {}", player, name))
        }
    }
}

async fn run_roster(command: RosterCommand, config: &AppConfig) -> Result<String> {
    let request = command.request()?;
    let controller = controller_for(command.league(), config)?;
    let timing = command.timing();

    let target = controller.resolve_target(timing.start.as_deref(), timing.now)?;
    info!("Transaction scheduled for {}", target.to_rfc3339());

    if timing.now {
        tokio::task::spawn_blocking(|| confirm_proceed(std::io::stdin().lock(), std::io::stdout()))
            .await
            .map_err(|e| FantasyError::Internal(format!("Prompt task failed: {}", e)))??;
    }

    let report = controller.run(&request, target).await?;
    Ok(report.message)
}

fn controller_for(league: &str, config: &AppConfig) -> Result<RosterController<YahooClient>> {
    let league = config.league(league)?.clone();
    let client = YahooClient::new(
        &config.yahoo,
        league.clone(),
        config.settings.request_timeout(),
    )?;
    RosterController::new(Arc::new(client), league, config)
}
