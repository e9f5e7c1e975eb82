//! minitree CLI - train and compare game-tree players
//!
//! Subcommands:
//! - `train`: an exploring learner against a chosen opponent
//! - `duel`: any two strategies against each other

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "minitree")]
#[command(version, about = "Game-tree learning players", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an exploring player, optionally seeding the tree from game records
    Train(minitree::cli::commands::train::TrainArgs),

    /// Play two strategies against each other
    Duel(minitree::cli::commands::duel::DuelArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => minitree::cli::commands::train::execute(args),
        Commands::Duel(args) => minitree::cli::commands::duel::execute(args),
    }
}
