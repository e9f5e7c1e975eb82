//! ε-greedy learning player.
//!
//! The player walks the shared tree during a game, mostly following the child
//! with the best record and sometimes trying a move nobody has recorded yet.
//! When the game ends it tallies the result along the path it walked and
//! lowers its exploration rate.

use rand::{Rng, prelude::IndexedRandom, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::{TreePlayer, build_rng};
use crate::{
    Error, Result,
    rules::{Outcome, RulesEngine},
    tree::{NodeId, TreeFor},
};

/// Exploration rate schedule: start at `initial_rate`, multiply by
/// `decay_factor` after every game, never drop below `min_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    pub initial_rate: f64,
    pub decay_factor: f64,
    pub min_rate: f64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            initial_rate: 1.0,
            decay_factor: 0.995,
            min_rate: 0.05,
        }
    }
}

impl ExplorationConfig {
    pub fn new(initial_rate: f64, decay_factor: f64, min_rate: f64) -> Self {
        Self {
            initial_rate,
            decay_factor,
            min_rate,
        }
    }

    /// A rate that never changes.
    pub fn constant(rate: f64) -> Self {
        Self::new(rate, 1.0, rate)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("initial_rate", self.initial_rate),
            ("decay_factor", self.decay_factor),
            ("min_rate", self.min_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfiguration {
                    message: format!("{name} must be within [0, 1], got {value}"),
                });
            }
        }
        if self.min_rate > self.initial_rate {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "min_rate {} exceeds initial_rate {}",
                    self.min_rate, self.initial_rate
                ),
            });
        }
        Ok(())
    }
}

/// Where the player is in its explore/exploit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExplorationPhase {
    /// Fresh or reset; the rate equals `initial_rate`.
    Initializing,
    /// The last move tried an unrecorded child.
    Exploring,
    /// The last move followed the best recorded child.
    Exploiting,
    /// A game just ended and the rate was lowered.
    Decayed,
}

/// Learning player that records its games in the shared tree.
#[derive(Debug, Clone)]
pub struct ExploringPlayer<P> {
    name: String,
    config: ExplorationConfig,
    rate: f64,
    phase: ExplorationPhase,
    /// Positions of the current game, root first
    path: Vec<P>,
    /// Parity of the path indices at which this player chose a move
    mover_parity: Option<usize>,
    games_completed: usize,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl<P> ExploringPlayer<P> {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if a rate lies outside `[0, 1]`
    /// or `min_rate` exceeds `initial_rate`.
    pub fn new(config: ExplorationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: "exploring".to_string(),
            rate: config.initial_rate,
            config,
            phase: ExplorationPhase::Initializing,
            path: Vec::new(),
            mover_parity: None,
            games_completed: 0,
            rng: build_rng(None),
            rng_seed: None,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn config(&self) -> &ExplorationConfig {
        &self.config
    }

    /// Current probability of trying an unrecorded move.
    pub fn exploration_rate(&self) -> f64 {
        self.rate
    }

    pub fn phase(&self) -> ExplorationPhase {
        self.phase
    }

    /// Positions visited so far in the current game.
    pub fn path(&self) -> &[P] {
        &self.path
    }

    pub fn games_completed(&self) -> usize {
        self.games_completed
    }

    /// Override the exploration rate, e.g. from an explicit per-game schedule.
    pub fn set_rate(&mut self, rate: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(Error::InvalidConfiguration {
                message: format!("exploration rate must be within [0, 1], got {rate}"),
            });
        }
        self.rate = rate;
        Ok(())
    }

    /// Lower the rate by one game's worth of decay.
    pub fn decay(&mut self) {
        self.rate = (self.rate * self.config.decay_factor).max(self.config.min_rate);
        self.phase = ExplorationPhase::Decayed;
    }

    /// Close the current game: count it, decay the rate and hand back the
    /// walked path with the parity of this player's decisions.
    fn finish_game(&mut self) -> (Vec<P>, Option<usize>) {
        let path = std::mem::take(&mut self.path);
        let mover_parity = self.mover_parity.take();
        self.games_completed += 1;
        self.decay();
        (path, mover_parity)
    }

    /// Forget the current game and return to `initial_rate`.
    pub fn reset_state(&mut self) {
        self.rate = self.config.initial_rate;
        self.phase = ExplorationPhase::Initializing;
        self.path.clear();
        self.mover_parity = None;
        self.games_completed = 0;
        self.rng = build_rng(self.rng_seed);
    }
}

impl<P> ExploringPlayer<P>
where
    P: Clone + Eq + std::hash::Hash + std::fmt::Debug,
{
    /// Bring the path up to `position`.
    ///
    /// An empty path starts at the tree root. If the last known position is
    /// not `position`, exactly one move (the opponent's) must connect them;
    /// that move is recorded in the tree.
    fn sync_path<R>(&mut self, tree: &mut TreeFor<R>, position: &P, rules: &R) -> Result<()>
    where
        R: RulesEngine<Position = P>,
    {
        if self.path.is_empty() {
            self.path.push(tree.root().clone());
        }
        let Some(last) = self.path.last().cloned() else {
            return Ok(());
        };
        if last == *position {
            return Ok(());
        }

        let recorded = tree
            .get_node(&last)
            .and_then(|node| {
                node.children()
                    .iter()
                    .find(|(_, child)| tree.node(*child).position() == position)
            })
            .is_some();
        if recorded {
            self.path.push(position.clone());
            return Ok(());
        }

        for mv in rules.legal_moves(&last) {
            let next = rules.apply_move(&last, &mv)?;
            if next == *position {
                tree.add_child(&last, mv, &next)?;
                self.path.push(next);
                return Ok(());
            }
        }

        Err(Error::UnreachablePosition {
            from: format!("{last:?}"),
            target: format!("{position:?}"),
        })
    }

    /// Uniform choice among legal moves that are not yet children of `parent`.
    fn explore<M: Clone + Eq>(&mut self, children: &[(M, NodeId)], legal: &[M]) -> Option<M> {
        let unexplored: Vec<&M> = legal
            .iter()
            .filter(|mv| !children.iter().any(|(recorded, _)| recorded == *mv))
            .collect();
        unexplored.choose(&mut self.rng).map(|mv| (*mv).clone())
    }
}

/// Recorded child with the highest win probability; ties go to the child with
/// fewer visits, then to the earliest recorded move.
fn best_recorded<R: RulesEngine>(tree: &TreeFor<R>, parent: NodeId) -> Option<R::Move> {
    let mut best: Option<(&R::Move, f64, u64)> = None;
    for (mv, child) in tree.node(parent).children() {
        let node = tree.node(*child);
        let probability = node.win_probability();
        let visits = node.visit_count();
        let better = match best {
            None => true,
            Some((_, top, top_visits)) => {
                probability > top || (probability == top && visits < top_visits)
            }
        };
        if better {
            best = Some((mv, probability, visits));
        }
    }
    best.map(|(mv, _, _)| mv.clone())
}

impl<R: RulesEngine> TreePlayer<R> for ExploringPlayer<R::Position> {
    fn choose_move(
        &mut self,
        tree: &mut TreeFor<R>,
        position: &R::Position,
        rules: &R,
    ) -> Result<R::Move> {
        let legal = rules.legal_moves(position);
        if legal.is_empty() {
            return Err(Error::no_legal_moves(position));
        }

        self.sync_path(tree, position, rules)?;
        let decision_index = self.path.len() - 1;
        self.mover_parity.get_or_insert(decision_index % 2);

        let parent = tree
            .node_id(position)
            .ok_or_else(|| Error::unknown_position(position))?;
        let children = tree.node(parent).children().to_vec();

        let wants_exploration = self.rng.random_bool(self.rate);
        let choice = if wants_exploration {
            self.explore(&children, &legal)
                .map(|mv| (mv, ExplorationPhase::Exploring))
                .or_else(|| {
                    best_recorded::<R>(tree, parent).map(|mv| (mv, ExplorationPhase::Exploiting))
                })
        } else {
            best_recorded::<R>(tree, parent)
                .map(|mv| (mv, ExplorationPhase::Exploiting))
                .or_else(|| {
                    self.explore(&children, &legal)
                        .map(|mv| (mv, ExplorationPhase::Exploring))
                })
        };
        let (mv, phase) = choice.ok_or_else(|| Error::no_legal_moves(position))?;

        let next = match tree.child_position(position, &mv) {
            Some(known) => known.clone(),
            None => {
                let next = rules.apply_move(position, &mv)?;
                tree.add_child(position, mv.clone(), &next)?;
                next
            }
        };
        self.path.push(next);
        self.phase = phase;
        Ok(mv)
    }

    fn observe(&mut self, tree: &mut TreeFor<R>, position: &R::Position, rules: &R) -> Result<()> {
        self.sync_path(tree, position, rules)
    }

    /// Tally `result` (from this player's side) along the walked path, then
    /// decay the exploration rate and start a fresh path.
    fn on_game_end(&mut self, tree: &mut TreeFor<R>, result: Outcome) -> Result<()> {
        let (path, mover_parity) = self.finish_game();
        if path.len() < 2 {
            return Ok(());
        }
        let last = path.len() - 1;
        // Nodes this player moved into sit one index after its decisions. A
        // player that never moved did not make the last move either.
        let moved_last = mover_parity.is_some_and(|parity| last % 2 == (parity + 1) % 2);
        let for_last_mover = if moved_last {
            result
        } else {
            result.flipped()
        };
        tree.record_outcome(&path, for_last_mover)
    }

    fn records_outcomes(&self) -> bool {
        true
    }

    fn on_shared_game_end(&mut self, _result: Outcome) -> Result<()> {
        self.finish_game();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = build_rng(Some(seed));
        self.rng_seed = Some(seed);
    }

    fn reset(&mut self) {
        self.reset_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        games::{ScriptedGame, TakeAway},
        rules::History,
        tree::GameTree,
    };

    fn three_way() -> ScriptedGame {
        ScriptedGame::new("P0")
            .edge("P0", "a", "A")
            .edge("P0", "b", "B")
            .edge("P0", "c", "C")
            .terminal("A", Outcome::Loss)
            .terminal("B", Outcome::Win)
            .terminal("C", Outcome::Draw)
    }

    fn play_solo(
        player: &mut ExploringPlayer<String>,
        tree: &mut GameTree<String, String>,
        game: &ScriptedGame,
    ) -> String {
        let start = game.start();
        let mv = player.choose_move(tree, &start, game).unwrap();
        let end = game.apply_move(&start, &mv).unwrap();
        let result = game.outcome(&end).unwrap();
        TreePlayer::<ScriptedGame>::on_game_end(player, tree, result).unwrap();
        mv
    }

    #[test]
    fn rates_outside_unit_interval_are_rejected() {
        assert!(ExploringPlayer::<String>::new(ExplorationConfig::new(1.5, 0.9, 0.1)).is_err());
        assert!(ExploringPlayer::<String>::new(ExplorationConfig::new(0.5, 0.9, 0.6)).is_err());
        assert!(ExploringPlayer::<String>::new(ExplorationConfig::new(0.5, -0.1, 0.0)).is_err());
    }

    #[test]
    fn decay_is_multiplicative_and_floored() {
        let mut player = ExploringPlayer::<String>::new(ExplorationConfig::new(1.0, 0.5, 0.2)).unwrap();
        assert_eq!(player.phase(), ExplorationPhase::Initializing);
        player.decay();
        assert_eq!(player.exploration_rate(), 0.5);
        player.decay();
        player.decay();
        assert_eq!(player.exploration_rate(), 0.2);
        assert_eq!(player.phase(), ExplorationPhase::Decayed);

        player.reset_state();
        assert_eq!(player.exploration_rate(), 1.0);
        assert_eq!(player.phase(), ExplorationPhase::Initializing);
    }

    #[test]
    fn full_exploration_records_every_root_move_first() {
        let game = three_way();
        let mut tree = GameTree::new(game.start());
        let mut player = ExploringPlayer::new(ExplorationConfig::constant(1.0))
            .unwrap()
            .with_seed(3);

        let mut first_moves = Vec::new();
        for _ in 0..3 {
            first_moves.push(play_solo(&mut player, &mut tree, &game));
            assert_eq!(player.phase(), ExplorationPhase::Decayed);
        }
        first_moves.sort();
        assert_eq!(first_moves, vec!["a", "b", "c"]);
        assert_eq!(tree.get_node(&game.start()).unwrap().children().len(), 3);
    }

    #[test]
    fn exploitation_follows_the_best_record() {
        let game = three_way();
        let mut tree = GameTree::new(game.start());
        let mut player = ExploringPlayer::new(ExplorationConfig::new(1.0, 0.0, 0.0))
            .unwrap()
            .with_seed(11);

        play_solo(&mut player, &mut tree, &game);
        assert_eq!(player.exploration_rate(), 0.0);
        // the single recorded child is the only exploitation candidate
        let first = tree.get_node(&game.start()).unwrap().children()[0].0.clone();
        for _ in 0..5 {
            assert_eq!(play_solo(&mut player, &mut tree, &game), first);
            assert_eq!(player.phase(), ExplorationPhase::Decayed);
        }
    }

    #[test]
    fn ties_prefer_fewer_visits() {
        let game = ScriptedGame::new("P0")
            .edge("P0", "a", "A")
            .edge("P0", "b", "B")
            .terminal("A", Outcome::Draw)
            .terminal("B", Outcome::Draw);
        let mut tree = GameTree::new(game.start());
        let p0 = game.start();
        tree.add_child(&p0, "a".to_string(), &"A".to_string()).unwrap();
        tree.add_child(&p0, "b".to_string(), &"B".to_string()).unwrap();
        tree.record_outcome(&[p0.clone(), "A".to_string()], Outcome::Draw)
            .unwrap();
        tree.record_outcome(&[p0.clone(), "A".to_string()], Outcome::Draw)
            .unwrap();
        tree.record_outcome(&[p0.clone(), "B".to_string()], Outcome::Draw)
            .unwrap();

        let id = tree.node_id(&p0).unwrap();
        assert_eq!(best_recorded::<ScriptedGame>(&tree, id), Some("b".to_string()));
    }

    #[test]
    fn outcome_is_tallied_from_each_movers_side() {
        // The opponent moves first; the explorer replies and wins.
        let game = ScriptedGame::new("P0")
            .edge("P0", "o", "P1")
            .edge("P1", "x", "P2")
            .terminal("P2", Outcome::Win);
        let mut tree = GameTree::new(game.start());
        let mut player = ExploringPlayer::new(ExplorationConfig::constant(0.0))
            .unwrap()
            .with_seed(5);

        let p1 = "P1".to_string();
        let mv = player.choose_move(&mut tree, &p1, &game).unwrap();
        assert_eq!(mv, "x");
        assert_eq!(player.path().len(), 3);
        TreePlayer::<ScriptedGame>::on_game_end(&mut player, &mut tree, Outcome::Win).unwrap();

        assert_eq!(tree.get_node(&"P2".to_string()).unwrap().win_count(), 1);
        assert_eq!(tree.get_node(&p1).unwrap().loss_count(), 1);
        assert_eq!(tree.get_node(&game.start()).unwrap().win_count(), 1);
        assert!(player.path().is_empty());
        assert_eq!(player.games_completed(), 1);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn learner_that_never_moved_still_tallies_the_game() {
        let game = ScriptedGame::new("P0")
            .edge("P0", "a", "A")
            .terminal("A", Outcome::Win);
        let mut tree = GameTree::new(game.start());
        let mut opponent = crate::players::RandomTreePlayer::new().with_seed(1);
        let mut player = ExploringPlayer::new(ExplorationConfig::default())
            .unwrap()
            .with_seed(2);

        let seats: [&mut dyn TreePlayer<ScriptedGame>; 2] = [&mut opponent, &mut player];
        let report = crate::session::play_game(&mut tree, seats, &game.start(), &game, 10).unwrap();
        assert_eq!(report.result_for(1), Outcome::Loss);

        let root = tree.get_node(&game.start()).unwrap();
        assert_eq!((root.visit_count(), root.loss_count()), (1, 1));
        assert_eq!(tree.get_node(&"A".to_string()).unwrap().win_count(), 1);
        assert_eq!(player.games_completed(), 1);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn shared_game_end_leaves_the_tree_alone() {
        let game = three_way();
        let mut tree = GameTree::new(game.start());
        let mut player = ExploringPlayer::new(ExplorationConfig::new(1.0, 0.5, 0.0))
            .unwrap()
            .with_seed(4);

        player.choose_move(&mut tree, &game.start(), &game).unwrap();
        TreePlayer::<ScriptedGame>::on_shared_game_end(&mut player, Outcome::Win).unwrap();

        assert_eq!(tree.get_node(&game.start()).unwrap().visit_count(), 0);
        assert!(player.path().is_empty());
        assert_eq!(player.exploration_rate(), 0.5);
        assert_eq!(player.games_completed(), 1);
    }

    #[test]
    fn history_positions_sync_through_opponent_moves() {
        let rules = History::new(TakeAway::new(2));
        let root = rules.start(TakeAway::new(2).start(4));
        let mut tree = GameTree::new(root.clone());
        let mut player = ExploringPlayer::new(ExplorationConfig::constant(1.0))
            .unwrap()
            .with_seed(8);

        let after_opponent = rules.apply_move(&root, &2).unwrap();
        player.choose_move(&mut tree, &after_opponent, &rules).unwrap();
        assert_eq!(player.path()[0], root);
        assert_eq!(player.path()[1], after_opponent);
        assert_eq!(tree.child_position(&root, &2), Some(&after_opponent));
    }

    #[test]
    fn disconnected_position_is_reported() {
        let game = TakeAway::new(1);
        let mut tree = GameTree::new(game.start(5));
        let mut player = ExploringPlayer::new(ExplorationConfig::default()).unwrap();
        let err = player
            .choose_move(&mut tree, &game.start(2), &game)
            .unwrap_err();
        assert!(matches!(err, Error::UnreachablePosition { .. }));
    }
}
