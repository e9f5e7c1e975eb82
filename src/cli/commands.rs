//! Subcommands of the `minitree` binary.

pub mod duel;
pub mod train;

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::{
    config::{SimulationConfig, load_config},
    players::{ExploringPlayer, GreedyTreePlayer, RandomTreePlayer, Strategy},
};

/// Strategies selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    Random,
    Greedy,
    Exploring,
}

impl StrategyKind {
    /// Build the player from the simulation config.
    pub fn build<P>(self, config: &SimulationConfig, seed: Option<u64>) -> Result<Strategy<P>> {
        let strategy = match self {
            StrategyKind::Random => {
                let player = RandomTreePlayer::new();
                Strategy::from(match seed {
                    Some(seed) => player.with_seed(seed),
                    None => player,
                })
            }
            StrategyKind::Greedy => Strategy::from(
                GreedyTreePlayer::new(config.greedy).context("invalid greedy settings")?,
            ),
            StrategyKind::Exploring => {
                let player = ExploringPlayer::new(config.exploration)
                    .context("invalid exploration settings")?;
                Strategy::from(match seed {
                    Some(seed) => player.with_seed(seed),
                    None => player,
                })
            }
        };
        Ok(strategy)
    }
}

/// Config from `--config` if given, otherwise the usual search.
pub(crate) fn resolve_config(explicit: Option<&Path>) -> Result<SimulationConfig> {
    match explicit {
        Some(path) => SimulationConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(load_config()),
    }
}
