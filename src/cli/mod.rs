//! CLI module for Switchyard
//!
//! Provides commands:
//! - `run`: Console chat loop
//! - `doctor`: Configuration and backend diagnostics
//! - `prune`: Remove inactive sessions

use crate::server::config::AppConfig;
use clap::{Parser, Subcommand};

pub mod doctor;
pub mod prune;

/// Switchyard task router CLI
#[derive(Parser, Debug)]
#[command(name = "switchyard")]
#[command(about = "Conversational task router")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Chat with the router from this terminal
    Run,
    /// Run configuration and backend diagnostics
    Doctor,
    /// Remove sessions that have been inactive for a while
    Prune {
        /// Inactivity horizon in days (defaults to session.inactive_days)
        #[arg(long)]
        days: Option<u64>,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Run) => crate::server::run(config).await,
        Some(Commands::Doctor) => doctor::run(&config).await,
        Some(Commands::Prune { days }) => {
            prune::run(&config, days.unwrap_or(config.session.inactive_days)).await
        }
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
