//! Train command - run an exploring learner against an opponent

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;

use super::{StrategyKind, resolve_config};
use crate::{
    cli::output::{percent, print_kv, print_results, print_section},
    config::SimulationConfig,
    players::{ExploringPlayer, Strategy},
    records::{insert_record, load_records},
    rules::History,
    session::{ParallelConfig, SeatPolicy, TrainingSession, TrainingSummary, run_parallel},
    shared::SharedTree,
    tree::GameTree,
};

#[derive(Parser, Debug)]
#[command(about = "Train an exploring player on the take-away game")]
pub struct TrainArgs {
    /// TOML simulation config (defaults to MINITREE_CONFIG or ./minitree.toml)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Opponent strategy
    #[arg(long, short = 'o', value_enum, default_value = "random")]
    pub opponent: StrategyKind,

    /// Number of training games (overrides the config)
    #[arg(long, short = 'g')]
    pub games: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Starting pile size (overrides the config)
    #[arg(long)]
    pub stones: Option<u32>,

    /// Seat taken by the learner
    #[arg(long, value_enum)]
    pub seat: Option<SeatArg>,

    /// CSV file of games to seed the tree with, one game per row
    #[arg(long)]
    pub records: Option<PathBuf>,

    /// Write a JSON training summary here
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Print the trained tree down to this many plies
    #[arg(long)]
    pub render_depth: Option<usize>,

    /// Play on this many threads against one shared tree
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Show progress bar
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub progress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SeatArg {
    First,
    Second,
    Alternate,
}

impl From<SeatArg> for SeatPolicy {
    fn from(seat: SeatArg) -> Self {
        match seat {
            SeatArg::First => SeatPolicy::First,
            SeatArg::Second => SeatPolicy::Second,
            SeatArg::Alternate => SeatPolicy::Alternate,
        }
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(games) = args.games {
        config = config.with_games(games);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(stones) = args.stones {
        config = config.with_stones(stones);
    }
    if let Some(seat) = args.seat {
        config = config.with_seat(seat.into());
    }
    config.session.show_progress = args.progress && args.workers <= 1;
    config.validate().context("Invalid simulation config")?;

    let game = config.game.rules();
    let rules = History::new(game.clone());
    let start = rules.start(game.start(config.game.stones));

    let mut tree = GameTree::new(start.clone());
    if let Some(path) = &args.records {
        let records = load_records::<u32>(path)
            .with_context(|| format!("Failed to read game records from {}", path.display()))?;
        for record in &records {
            insert_record(&mut tree, record, &rules)
                .with_context(|| format!("Invalid game record in {}", path.display()))?;
        }
        info!(games = records.len(), nodes = tree.len(), "seeded tree from records");
    }

    let seed = config.session.seed;
    let opponent_seed = seed.map(|seed| seed.wrapping_add(1));

    let (tree, summary) = if args.workers > 1 {
        if config.session.seat != SeatPolicy::First {
            bail!("--workers only supports the learner in the first seat");
        }
        let shared = SharedTree::new(tree);
        let mut parallel = ParallelConfig::new(args.workers, config.session.games)
            .with_max_plies(config.session.max_plies)
            .with_history_interval(config.session.history_interval);
        if let Some(schedule) = config.session.rate_schedule {
            parallel = parallel.with_rate_schedule(schedule);
        }
        let results = run_parallel(&shared, &rules, &start, &parallel, |worker| {
            let offset = 2 * worker as u64;
            let learner = StrategyKind::Exploring
                .build(&config, seed.map(|seed| seed.wrapping_add(offset)))
                .map_err(|e| invalid_worker_setup(&e))?;
            let opponent = args
                .opponent
                .build(&config, opponent_seed.map(|seed| seed.wrapping_add(offset)))
                .map_err(|e| invalid_worker_setup(&e))?;
            Ok([learner, opponent])
        })?;
        let tree = shared.into_inner()?;
        let summary = TrainingSummary {
            version: TrainingSummary::VERSION,
            learner: "exploring".to_string(),
            opponent: format!("{:?}", args.opponent).to_lowercase(),
            games: results.games(),
            wins: results.wins,
            draws: results.draws,
            losses: results.losses,
            truncated: results.truncated,
            win_rate: results.win_rate(),
            final_exploration_rate: worker_final_rate(&config, &parallel),
            win_rate_history: results.win_rate_history.clone(),
            tree: tree.stats(),
        };
        print_section("Parallel training results");
        print_results(&results);
        (tree, summary)
    } else {
        let learner =
            ExploringPlayer::new(config.exploration).context("Invalid exploration settings")?;
        let opponent: Strategy<_> = args.opponent.build(&config, opponent_seed)?;
        let mut session =
            TrainingSession::new(rules, start, learner, opponent, config.session.clone())?
                .with_tree(tree)?;
        session.train()?;

        print_section("Training results");
        print_results(session.results());
        print_kv(
            "Exploration rate",
            &format!("{:.4}", session.learner().exploration_rate()),
        );
        if let Some(last) = session.results().win_rate_history.last() {
            print_kv("Last checkpoint", &percent(*last));
        }
        let summary = session.summary();
        (session.into_tree(), summary)
    };

    let stats = tree.stats();
    print_kv("Tree nodes", &stats.nodes.to_string());
    print_kv("Visited nodes", &stats.visited_nodes.to_string());

    if let Some(path) = &args.summary {
        summary
            .save(path)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        println!("\nSummary written to {}", path.display());
    }

    if let Some(depth) = args.render_depth {
        print_section("Game tree");
        if let Some(text) = tree.render(tree.root(), depth) {
            print!("{text}");
        }
    }
    Ok(())
}

/// Rate the first worker's learner ends on. Without a schedule that is the
/// configured decay applied once per game it played; with one, the last
/// scheduled rate decayed once.
fn worker_final_rate(config: &SimulationConfig, parallel: &ParallelConfig) -> f64 {
    let exploration = &config.exploration;
    let games = parallel.games_for(0);
    let rate = match &parallel.rate_schedule {
        Some(_) if games == 0 => return exploration.initial_rate,
        Some(schedule) => {
            schedule.rate_for(parallel.games.saturating_sub(1)) * exploration.decay_factor
        }
        None => exploration.initial_rate * exploration.decay_factor.powi(games as i32),
    };
    rate.max(exploration.min_rate)
}

fn invalid_worker_setup(error: &anyhow::Error) -> crate::Error {
    crate::Error::InvalidConfiguration {
        message: format!("{error:#}"),
    }
}
