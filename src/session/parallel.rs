//! Games played on several threads against one shared tree.

use std::sync::Mutex;

use rayon::prelude::*;
use tracing::{debug, info};

use super::{DEFAULT_MAX_PLIES, RateSchedule, TrainingResults, play_game};
use crate::{
    Error, Result,
    players::{Strategy, TreePlayer},
    rules::RulesEngine,
    shared::SharedTree,
};

/// How many games to play on how many threads.
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelConfig {
    /// Size of the thread pool; each thread seats its own pair of players.
    pub workers: usize,
    /// Total games across all workers.
    pub games: usize,
    pub max_plies: usize,
    /// Record the first seat's win rate every this many games (0 disables).
    pub history_interval: usize,
    /// Per-game exploration rate for an exploring player in seat 0, indexed
    /// by the order in which games take the tree lock.
    pub rate_schedule: Option<RateSchedule>,
}

impl ParallelConfig {
    pub fn new(workers: usize, games: usize) -> Self {
        Self {
            workers,
            games,
            max_plies: DEFAULT_MAX_PLIES,
            history_interval: 0,
            rate_schedule: None,
        }
    }

    pub fn with_max_plies(mut self, max_plies: usize) -> Self {
        self.max_plies = max_plies;
        self
    }

    pub fn with_history_interval(mut self, interval: usize) -> Self {
        self.history_interval = interval;
        self
    }

    pub fn with_rate_schedule(mut self, schedule: RateSchedule) -> Self {
        self.rate_schedule = Some(schedule);
        self
    }

    /// Games assigned to `worker`: an even share, with the remainder going
    /// one each to the lowest-numbered workers.
    pub fn games_for(&self, worker: usize) -> usize {
        if self.workers == 0 {
            return 0;
        }
        let base = self.games / self.workers;
        if worker < self.games % self.workers {
            base + 1
        } else {
            base
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidConfiguration {
                message: "parallel training needs at least one worker".to_string(),
            });
        }
        if self.max_plies == 0 {
            return Err(Error::InvalidConfiguration {
                message: "max_plies must be at least 1".to_string(),
            });
        }
        if let Some(schedule) = &self.rate_schedule {
            schedule.validate()?;
        }
        Ok(())
    }
}

/// Play `config.games` games on a rayon pool of `config.workers` threads.
///
/// `make_seats(worker)` builds the two players for one worker; seat 0 moves
/// first and the returned results are from its side. Each game holds the
/// tree lock from its first move to its last tally, so concurrent games never
/// interleave their updates. Results and win-rate checkpoints are counted in
/// the order games finish.
pub fn run_parallel<R, F>(
    shared: &SharedTree<R::Position, R::Move>,
    rules: &R,
    start: &R::Position,
    config: &ParallelConfig,
    make_seats: F,
) -> Result<TrainingResults>
where
    R: RulesEngine + Sync,
    R::Position: Send + Sync,
    R::Move: Send,
    F: Fn(usize) -> Result<[Strategy<R::Position>; 2]> + Sync,
{
    config.validate()?;
    info!(
        workers = config.workers,
        games = config.games,
        "starting parallel games"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()?;
    let totals = Mutex::new(TrainingResults::default());

    pool.install(|| {
        (0..config.workers)
            .into_par_iter()
            .map(|worker| {
                let seats = make_seats(worker)?;
                worker_games(shared, rules, start, config, worker, seats, &totals)
            })
            .collect::<Result<Vec<usize>>>()
    })?;

    let total = totals.into_inner().map_err(|_| Error::TreePoisoned)?;
    info!(
        wins = total.wins,
        draws = total.draws,
        losses = total.losses,
        "parallel games finished"
    );
    Ok(total)
}

/// Play one worker's share of games; returns how many it played.
fn worker_games<R>(
    shared: &SharedTree<R::Position, R::Move>,
    rules: &R,
    start: &R::Position,
    config: &ParallelConfig,
    worker: usize,
    seats: [Strategy<R::Position>; 2],
    totals: &Mutex<TrainingResults>,
) -> Result<usize>
where
    R: RulesEngine,
{
    let [mut first, mut second] = seats;
    let games = config.games_for(worker);
    for _ in 0..games {
        shared.with(|tree| {
            // The tree lock is held, so game order is fixed here.
            let mut totals = totals.lock().map_err(|_| Error::TreePoisoned)?;
            if let (Some(schedule), Some(learner)) =
                (&config.rate_schedule, first.as_exploring_mut())
            {
                learner.set_rate(schedule.rate_for(totals.games()))?;
            }

            let seats: [&mut dyn TreePlayer<R>; 2] = [&mut first, &mut second];
            let report = play_game(tree, seats, start, rules, config.max_plies)?;
            totals.record(report.first_seat_result);
            if report.truncated {
                totals.truncated += 1;
            }
            let interval = config.history_interval;
            if interval > 0 && totals.games().is_multiple_of(interval) {
                let win_rate = totals.win_rate();
                totals.win_rate_history.push(win_rate);
            }
            Ok(())
        })?;
    }
    debug!(worker, games, "worker finished");
    Ok(games)
}
