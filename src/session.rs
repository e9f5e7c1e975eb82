//! Game driver and training loop.
//!
//! [`play_game`] runs one game between two seated [`TreePlayer`]s and tells
//! both how it ended. [`TrainingSession`] repeats that for an
//! [`ExploringPlayer`] against a fixed opponent and keeps score.

mod parallel;
mod summary;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use parallel::{ParallelConfig, run_parallel};
pub use summary::TrainingSummary;

use crate::{
    Error, Result,
    players::{ExploringPlayer, Strategy, TreePlayer},
    records::GameRecord,
    rules::{Outcome, RulesEngine},
    tree::{GameTree, TreeFor},
};

/// Games longer than this are stopped and scored as a draw.
pub const DEFAULT_MAX_PLIES: usize = 200;

/// How one game went.
#[derive(Debug, Clone, PartialEq)]
pub struct GameReport<M> {
    /// Moves played, with the result for the side that made the last move.
    pub record: GameRecord<M>,
    /// Result for the player in seat 0, who moved first.
    pub first_seat_result: Outcome,
    /// `true` when the ply limit ended the game.
    pub truncated: bool,
}

impl<M> GameReport<M> {
    pub fn plies(&self) -> usize {
        self.record.len()
    }

    /// Result for the player in `seat` (0 or 1).
    pub fn result_for(&self, seat: usize) -> Outcome {
        if seat == 0 {
            self.first_seat_result
        } else {
            self.first_seat_result.flipped()
        }
    }
}

/// Play one game from `start`; `seats[0]` moves first.
///
/// After the last move each player is shown the final position and then
/// receives the result from its own side. The game is tallied in the tree at
/// most once: when both seats record outcomes, only the first one does and
/// the other gets [`TreePlayer::on_shared_game_end`]. A game that reaches
/// `max_plies` without ending counts as a draw.
pub fn play_game<R: RulesEngine>(
    tree: &mut TreeFor<R>,
    mut seats: [&mut dyn TreePlayer<R>; 2],
    start: &R::Position,
    rules: &R,
    max_plies: usize,
) -> Result<GameReport<R::Move>> {
    let mut position = start.clone();
    let mut moves = Vec::new();
    while !rules.is_terminal(&position) && moves.len() < max_plies {
        let seat = moves.len() % 2;
        let mv = seats[seat].choose_move(tree, &position, rules)?;
        position = rules.apply_move(&position, &mv)?;
        moves.push(mv);
    }

    let (last_mover_result, truncated) = match rules.outcome(&position) {
        Some(outcome) => (outcome, false),
        None => (Outcome::Draw, true),
    };
    // With no moves played the start position was entered by seat 1.
    let last_mover = (moves.len() + 1) % 2;
    let first_seat_result = if last_mover == 0 {
        last_mover_result
    } else {
        last_mover_result.flipped()
    };

    let mut tallied = false;
    for (seat, player) in seats.iter_mut().enumerate() {
        player.observe(tree, &position, rules)?;
        let result = if seat == 0 {
            first_seat_result
        } else {
            first_seat_result.flipped()
        };
        if tallied && player.records_outcomes() {
            player.on_shared_game_end(result)?;
        } else {
            tallied |= player.records_outcomes();
            player.on_game_end(tree, result)?;
        }
    }

    debug!(
        plies = moves.len(),
        truncated,
        result = ?first_seat_result,
        "game finished"
    );
    Ok(GameReport {
        record: GameRecord::new(moves).with_outcome(last_mover_result),
        first_seat_result,
        truncated,
    })
}

/// Which seat the learner takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatPolicy {
    #[default]
    First,
    Second,
    /// First in even-numbered games, second in odd ones.
    Alternate,
}

impl SeatPolicy {
    pub fn seat_for(self, game: usize) -> usize {
        match self {
            SeatPolicy::First => 0,
            SeatPolicy::Second => 1,
            SeatPolicy::Alternate => game % 2,
        }
    }
}

/// Explicit per-game exploration rates: a straight line from `start` to
/// `end` over `ramp_games` games, then `end` for the rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSchedule {
    pub start: f64,
    pub end: f64,
    pub ramp_games: usize,
}

impl RateSchedule {
    pub fn new(start: f64, end: f64, ramp_games: usize) -> Self {
        Self {
            start,
            end,
            ramp_games,
        }
    }

    pub fn rate_for(&self, game: usize) -> f64 {
        if game >= self.ramp_games {
            return self.end;
        }
        let progress = game as f64 / self.ramp_games as f64;
        self.start + (self.end - self.start) * progress
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.start) || !(0.0..=1.0).contains(&self.end) {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "rate schedule must stay within [0, 1], got {} to {}",
                    self.start, self.end
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub games: usize,
    pub max_plies: usize,
    pub seat: SeatPolicy,
    pub seed: Option<u64>,
    /// Record the running win rate every this many games; 0 disables it.
    pub history_interval: usize,
    pub show_progress: bool,
    pub rate_schedule: Option<RateSchedule>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            games: 1000,
            max_plies: DEFAULT_MAX_PLIES,
            seat: SeatPolicy::First,
            seed: None,
            history_interval: 100,
            show_progress: false,
            rate_schedule: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
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

/// Running score from the learner's side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingResults {
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    /// Games stopped by the ply limit (also counted as draws)
    pub truncated: usize,
    pub win_rate_history: Vec<f64>,
}

impl TrainingResults {
    pub fn games(&self) -> usize {
        self.wins + self.draws + self.losses
    }

    pub fn win_rate(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            games => self.wins as f64 / games as f64,
        }
    }

    pub fn record(&mut self, result: Outcome) {
        match result {
            Outcome::Win => self.wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Loss => self.losses += 1,
        }
    }

    /// Add another run's counts; histories are not merged.
    pub fn absorb(&mut self, other: &TrainingResults) {
        self.wins += other.wins;
        self.draws += other.draws;
        self.losses += other.losses;
        self.truncated += other.truncated;
    }
}

/// An exploring learner training against one opponent on a tree it owns.
pub struct TrainingSession<R: RulesEngine> {
    rules: R,
    start: R::Position,
    tree: TreeFor<R>,
    learner: ExploringPlayer<R::Position>,
    opponent: Strategy<R::Position>,
    config: SessionConfig,
    games_played: usize,
    results: TrainingResults,
}

impl<R: RulesEngine> TrainingSession<R> {
    pub fn new(
        rules: R,
        start: R::Position,
        mut learner: ExploringPlayer<R::Position>,
        mut opponent: Strategy<R::Position>,
        config: SessionConfig,
    ) -> Result<Self> {
        config.validate()?;
        if let Some(seed) = config.seed {
            TreePlayer::<R>::set_rng_seed(&mut learner, seed);
            TreePlayer::<R>::set_rng_seed(&mut opponent, seed.wrapping_add(1));
        }
        Ok(Self {
            tree: GameTree::new(start.clone()),
            rules,
            start,
            learner,
            opponent,
            config,
            games_played: 0,
            results: TrainingResults::default(),
        })
    }

    /// Continue from an existing tree, e.g. one seeded from game records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the tree is rooted elsewhere.
    pub fn with_tree(mut self, tree: TreeFor<R>) -> Result<Self> {
        if *tree.root() != self.start {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "tree root {:?} differs from the session start {:?}",
                    tree.root(),
                    self.start
                ),
            });
        }
        self.tree = tree;
        Ok(self)
    }

    pub fn tree(&self) -> &TreeFor<R> {
        &self.tree
    }

    pub fn into_tree(self) -> TreeFor<R> {
        self.tree
    }

    pub fn learner(&self) -> &ExploringPlayer<R::Position> {
        &self.learner
    }

    pub fn opponent(&self) -> &Strategy<R::Position> {
        &self.opponent
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn results(&self) -> &TrainingResults {
        &self.results
    }

    pub fn games_played(&self) -> usize {
        self.games_played
    }

    /// Play every configured game.
    pub fn train(&mut self) -> Result<&TrainingResults> {
        let progress = if self.config.show_progress {
            Some(training_progress(self.config.games)?)
        } else {
            None
        };
        info!(
            games = self.config.games,
            learner = TreePlayer::<R>::name(&self.learner),
            opponent = TreePlayer::<R>::name(&self.opponent),
            "starting training"
        );

        for game in 0..self.config.games {
            self.play_training_game(game)?;
            if let Some(pb) = &progress {
                pb.set_position(self.games_played as u64);
                pb.set_message(self.score_message());
            }
        }

        if let Some(pb) = &progress {
            pb.finish_with_message(self.score_message());
        }
        info!(
            wins = self.results.wins,
            draws = self.results.draws,
            losses = self.results.losses,
            nodes = self.tree.len(),
            rate = self.learner.exploration_rate(),
            "training finished"
        );
        Ok(&self.results)
    }

    /// Play a single game; `game` selects the seat and scheduled rate.
    /// Returns the result from the learner's side.
    pub fn play_training_game(&mut self, game: usize) -> Result<Outcome> {
        if let Some(schedule) = &self.config.rate_schedule {
            self.learner.set_rate(schedule.rate_for(game))?;
        }

        let seat = self.config.seat.seat_for(game);
        let learner: &mut dyn TreePlayer<R> = &mut self.learner;
        let opponent: &mut dyn TreePlayer<R> = &mut self.opponent;
        let seats = if seat == 0 {
            [learner, opponent]
        } else {
            [opponent, learner]
        };
        let report = play_game(
            &mut self.tree,
            seats,
            &self.start,
            &self.rules,
            self.config.max_plies,
        )?;

        let result = report.result_for(seat);
        self.results.record(result);
        if report.truncated {
            self.results.truncated += 1;
        }
        self.games_played += 1;

        let interval = self.config.history_interval;
        if interval > 0 && self.games_played.is_multiple_of(interval) {
            self.results.win_rate_history.push(self.results.win_rate());
            debug!(
                games = self.games_played,
                win_rate = self.results.win_rate(),
                rate = self.learner.exploration_rate(),
                "training checkpoint"
            );
        }
        Ok(result)
    }

    pub fn summary(&self) -> TrainingSummary {
        TrainingSummary {
            version: TrainingSummary::VERSION,
            learner: TreePlayer::<R>::name(&self.learner).to_string(),
            opponent: TreePlayer::<R>::name(&self.opponent).to_string(),
            games: self.games_played,
            wins: self.results.wins,
            draws: self.results.draws,
            losses: self.results.losses,
            truncated: self.results.truncated,
            win_rate: self.results.win_rate(),
            final_exploration_rate: self.learner.exploration_rate(),
            win_rate_history: self.results.win_rate_history.clone(),
            tree: self.tree.stats(),
        }
    }

    fn score_message(&self) -> String {
        format!(
            "W:{} D:{} L:{}",
            self.results.wins, self.results.draws, self.results.losses
        )
    }
}

pub(crate) fn training_progress(total_games: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total_games as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} games ({msg})")
            .map_err(|e| Error::ProgressBarTemplate {
                message: e.to_string(),
            })?
            .progress_chars("=>-"),
    );
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        games::{ScriptedGame, TakeAway},
        players::{ExplorationConfig, GreedyConfig, GreedyTreePlayer, RandomTreePlayer},
        rules::History,
    };

    #[test]
    fn first_seat_result_follows_the_last_mover() {
        // Seat 0 plays "a", seat 1 plays "b" into a position won by its mover.
        let game = ScriptedGame::new("P0")
            .edge("P0", "a", "P1")
            .edge("P1", "b", "P2")
            .terminal("P2", Outcome::Win);
        let mut tree = GameTree::new(game.start());
        let mut first = RandomTreePlayer::new().with_seed(1);
        let mut second = RandomTreePlayer::new().with_seed(2);
        let seats: [&mut dyn TreePlayer<ScriptedGame>; 2] = [&mut first, &mut second];

        let report = play_game(
            &mut tree,
            seats,
            &game.start(),
            &game,
            DEFAULT_MAX_PLIES,
        )
        .unwrap();
        assert_eq!(report.plies(), 2);
        assert_eq!(report.first_seat_result, Outcome::Loss);
        assert_eq!(report.result_for(1), Outcome::Win);
        assert_eq!(report.record.outcome, Some(Outcome::Win));
        assert!(!report.truncated);
    }

    #[test]
    fn ply_limit_scores_a_draw() {
        let game = TakeAway::new(1);
        let mut tree = GameTree::new(game.start(10));
        let mut first = RandomTreePlayer::new();
        let mut second = RandomTreePlayer::new();
        let seats: [&mut dyn TreePlayer<TakeAway>; 2] = [&mut first, &mut second];
        let report = play_game(&mut tree, seats, &game.start(10), &game, 3).unwrap();
        assert!(report.truncated);
        assert_eq!(report.plies(), 3);
        assert_eq!(report.first_seat_result, Outcome::Draw);
    }

    #[test]
    fn rate_schedule_ramps_then_holds() {
        let schedule = RateSchedule::new(1.0, 0.0, 4);
        assert_eq!(schedule.rate_for(0), 1.0);
        assert_eq!(schedule.rate_for(2), 0.5);
        assert_eq!(schedule.rate_for(4), 0.0);
        assert_eq!(schedule.rate_for(40), 0.0);
    }

    #[test]
    fn alternating_seats_keep_the_tree_consistent() {
        let take_away = TakeAway::new(2);
        let rules = History::new(take_away.clone());
        let start = rules.start(take_away.start(5));
        let learner = ExploringPlayer::new(ExplorationConfig::default()).unwrap();
        let opponent = Strategy::from(RandomTreePlayer::new());
        let config = SessionConfig {
            games: 50,
            seat: SeatPolicy::Alternate,
            seed: Some(7),
            history_interval: 10,
            ..SessionConfig::default()
        };

        let mut session = TrainingSession::new(rules, start, learner, opponent, config).unwrap();
        let results = session.train().unwrap().clone();
        assert_eq!(results.games(), 50);
        assert_eq!(results.win_rate_history.len(), 5);
        assert_eq!(session.learner().games_completed(), 50);
        assert_eq!(session.tree().stats().root_visits, 50);
        session.tree().check_invariants().unwrap();
    }

    #[test]
    fn self_play_tallies_each_game_once() {
        let take_away = TakeAway::new(2);
        let rules = History::new(take_away.clone());
        let start = rules.start(take_away.start(5));
        let learner = ExploringPlayer::new(ExplorationConfig::default()).unwrap();
        let opponent = Strategy::from(ExploringPlayer::new(ExplorationConfig::default()).unwrap());
        let config = SessionConfig {
            games: 10,
            seat: SeatPolicy::Alternate,
            seed: Some(1),
            ..SessionConfig::default()
        };

        let mut session = TrainingSession::new(rules, start, learner, opponent, config).unwrap();
        session.train().unwrap();
        assert_eq!(session.tree().stats().root_visits, 10);
        session.tree().check_invariants().unwrap();

        // Both learners still count the games and decay.
        let opponent = session.opponent().as_exploring().unwrap();
        assert_eq!(opponent.games_completed(), 10);
        assert!(opponent.exploration_rate() < 1.0);
        assert_eq!(session.learner().games_completed(), 10);
    }

    #[test]
    fn decayed_learner_settles_on_the_winning_move() {
        let game = ScriptedGame::new("P0")
            .edge("P0", "lose", "L")
            .edge("P0", "win", "W")
            .terminal("L", Outcome::Loss)
            .terminal("W", Outcome::Win);
        let learner = ExploringPlayer::new(ExplorationConfig::new(1.0, 0.9, 0.0)).unwrap();
        let opponent = Strategy::from(GreedyTreePlayer::new(GreedyConfig::new(1)).unwrap());
        let config = SessionConfig {
            games: 300,
            seed: Some(21),
            ..SessionConfig::default()
        };

        let start = game.start();
        let mut session = TrainingSession::new(game, start, learner, opponent, config).unwrap();
        session.train().unwrap();
        let late: Vec<Outcome> = (300..310)
            .map(|game| session.play_training_game(game).unwrap())
            .collect();
        assert!(late.iter().all(|result| *result == Outcome::Win), "{late:?}");
        assert_eq!(session.games_played(), 310);
    }

    #[test]
    fn foreign_tree_is_rejected() {
        let game = TakeAway::new(3);
        let learner = ExploringPlayer::new(ExplorationConfig::default()).unwrap();
        let session = TrainingSession::new(
            game.clone(),
            game.start(8),
            learner,
            Strategy::from(RandomTreePlayer::new()),
            SessionConfig::default(),
        )
        .unwrap();
        assert!(session.with_tree(GameTree::new(game.start(9))).is_err());
    }
}
