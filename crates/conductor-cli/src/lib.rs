//! Conductor CLI: run, inspect and clean the multi-agent pipeline.
//!
//! The binary in `main.rs` only installs logging and exits with the right
//! code; argument parsing and command dispatch live here so the
//! integration tests can drive them directly.

pub mod commands;

use clap::{Parser, Subcommand};

pub use commands::Settings;

/// Conductor: multi-agent pipeline orchestrator
#[derive(Parser, Debug)]
#[command(name = "conductor", version, about = "Conductor — multi-agent pipeline orchestrator")]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Execute the full pipeline
    Run,

    /// Show Complete/Pending for every agent's artifact
    Status,

    /// Delete all artifacts
    Clean,

    /// Execute a single agent (its inputs must already exist)
    Agent {
        /// Agent id, e.g. "research"
        id: String,
    },

    /// Check that every credential the pipeline needs is set
    CheckEnv,

    /// Validate the pipeline definition and print its stage plan
    Validate,
}

/// Run the parsed command.
pub async fn dispatch(cli: Cli) -> Result<(), String> {
    let settings = cli.settings;
    match cli.command {
        Some(Commands::Run) => commands::run::run(&settings).await,
        Some(Commands::Status) => commands::status::run(&settings).await,
        Some(Commands::Clean) => commands::clean::run(&settings).await,
        Some(Commands::Agent { id }) => commands::agent::run(&settings, &id).await,
        Some(Commands::CheckEnv) => commands::env::run(&settings),
        Some(Commands::Validate) => commands::validate::run(&settings),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    }
}
