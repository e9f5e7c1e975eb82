//! Duel command - pit two strategies against each other on one tree

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use super::{StrategyKind, resolve_config};
use crate::{
    cli::output::{print_kv, print_results, print_section},
    games::TakeAway,
    players::{Strategy, TreePlayer},
    rules::{History, RulesEngine},
    session::{TrainingResults, play_game, training_progress},
    tree::{GameTree, TreeStats},
};

type DuelRules = History<TakeAway>;
type DuelPosition = <DuelRules as RulesEngine>::Position;

#[derive(Parser, Debug)]
#[command(about = "Play two strategies against each other")]
pub struct DuelArgs {
    /// Strategy moving first
    #[arg(value_enum)]
    pub first: StrategyKind,

    /// Strategy moving second
    #[arg(value_enum)]
    pub second: StrategyKind,

    /// TOML simulation config (defaults to MINITREE_CONFIG or ./minitree.toml)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Number of games
    #[arg(long, short = 'g', default_value_t = 100)]
    pub games: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Starting pile size (overrides the config)
    #[arg(long)]
    pub stones: Option<u32>,

    /// Greedy search depth (overrides the config)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Show progress bar
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub progress: bool,
}

/// Score and tree shape after a duel.
#[derive(Debug, Clone)]
pub struct DuelReport {
    pub first: String,
    pub second: String,
    /// Results from the first seat's side
    pub results: TrainingResults,
    pub tree: TreeStats,
}

pub fn execute(args: DuelArgs) -> Result<()> {
    let report = run(&args)?;
    print_section(&format!("{} (first) vs {} (second)", report.first, report.second));
    print_results(&report.results);
    print_kv("Tree nodes", &report.tree.nodes.to_string());
    Ok(())
}

/// Play the duel without printing anything.
pub fn run(args: &DuelArgs) -> Result<DuelReport> {
    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(stones) = args.stones {
        config = config.with_stones(stones);
    }
    if let Some(depth) = args.depth {
        config = config.with_greedy_depth(depth);
    }
    config.validate().context("Invalid simulation config")?;

    let game = config.game.rules();
    let rules: DuelRules = History::new(game.clone());
    let start = rules.start(game.start(config.game.stones));
    let mut tree = GameTree::new(start.clone());

    let mut first: Strategy<DuelPosition> = args.first.build(&config, args.seed)?;
    let mut second: Strategy<DuelPosition> = args
        .second
        .build(&config, args.seed.map(|seed| seed.wrapping_add(1)))?;
    let first_name = TreePlayer::<DuelRules>::name(&first).to_string();
    let second_name = TreePlayer::<DuelRules>::name(&second).to_string();

    let progress = if args.progress {
        Some(training_progress(args.games)?)
    } else {
        None
    };
    let mut results = TrainingResults::default();
    for game_index in 0..args.games {
        let seats: [&mut dyn TreePlayer<DuelRules>; 2] = [&mut first, &mut second];
        let report = play_game(&mut tree, seats, &start, &rules, config.session.max_plies)?;
        results.record(report.first_seat_result);
        if report.truncated {
            results.truncated += 1;
        }
        if let Some(pb) = &progress {
            pb.set_position(game_index as u64 + 1);
        }
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(DuelReport {
        first: first_name,
        second: second_name,
        results,
        tree: tree.stats(),
    })
}
