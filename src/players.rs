//! Tree players: the decision strategies that consult the shared game tree.
//!
//! All strategies implement [`TreePlayer`], so a driver can seat any of them
//! without knowing which one it is. [`Strategy`] provides enum dispatch for
//! callers that want to hold "one of the three" by value.

pub mod exploring;
pub mod greedy;
pub mod random;

use rand::{SeedableRng, rngs::StdRng};

pub use exploring::{ExplorationConfig, ExplorationPhase, ExploringPlayer};
pub use greedy::{GreedyConfig, GreedyTreePlayer};
pub use random::RandomTreePlayer;

use crate::{
    Result,
    rules::{Outcome, RulesEngine},
    tree::TreeFor,
};

/// A player that picks moves with the help of a shared [`crate::GameTree`].
pub trait TreePlayer<R: RulesEngine> {
    /// Pick a move for the side to move in `position`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NoLegalMoves`] when `position` is terminal; the
    /// driver is expected to check for game end first.
    fn choose_move(
        &mut self,
        tree: &mut TreeFor<R>,
        position: &R::Position,
        rules: &R,
    ) -> Result<R::Move>;

    /// Show the player a position it did not choose a move in, typically the
    /// final position of a game decided by the opponent's move.
    fn observe(&mut self, _tree: &mut TreeFor<R>, _position: &R::Position, _rules: &R) -> Result<()> {
        Ok(())
    }

    /// Called once per finished game with the result from this player's side.
    ///
    /// Only learning players do anything here.
    fn on_game_end(&mut self, _tree: &mut TreeFor<R>, _result: Outcome) -> Result<()> {
        Ok(())
    }

    /// `true` if [`TreePlayer::on_game_end`] tallies the game in the tree.
    fn records_outcomes(&self) -> bool {
        false
    }

    /// Called instead of [`TreePlayer::on_game_end`] when another seat has
    /// already tallied this game in the same tree. The tree is left alone.
    fn on_shared_game_end(&mut self, _result: Outcome) -> Result<()> {
        Ok(())
    }

    /// Name used in logs and summaries.
    fn name(&self) -> &str;

    /// Reseed the player's random number generator.
    fn set_rng_seed(&mut self, _seed: u64) {}

    /// Return to the player's initial state.
    fn reset(&mut self) {}
}

/// The three shipped strategies behind one type.
#[derive(Debug)]
pub enum Strategy<P> {
    Random(RandomTreePlayer),
    Greedy(GreedyTreePlayer),
    Exploring(ExploringPlayer<P>),
}

impl<P> Strategy<P> {
    pub fn is_learning(&self) -> bool {
        matches!(self, Self::Exploring(_))
    }

    pub fn as_exploring(&self) -> Option<&ExploringPlayer<P>> {
        match self {
            Self::Exploring(player) => Some(player),
            _ => None,
        }
    }

    pub fn as_exploring_mut(&mut self) -> Option<&mut ExploringPlayer<P>> {
        match self {
            Self::Exploring(player) => Some(player),
            _ => None,
        }
    }
}

impl<P> From<RandomTreePlayer> for Strategy<P> {
    fn from(player: RandomTreePlayer) -> Self {
        Self::Random(player)
    }
}

impl<P> From<GreedyTreePlayer> for Strategy<P> {
    fn from(player: GreedyTreePlayer) -> Self {
        Self::Greedy(player)
    }
}

impl<P> From<ExploringPlayer<P>> for Strategy<P> {
    fn from(player: ExploringPlayer<P>) -> Self {
        Self::Exploring(player)
    }
}

impl<R> TreePlayer<R> for Strategy<R::Position>
where
    R: RulesEngine,
{
    fn choose_move(
        &mut self,
        tree: &mut TreeFor<R>,
        position: &R::Position,
        rules: &R,
    ) -> Result<R::Move> {
        match self {
            Self::Random(player) => player.choose_move(tree, position, rules),
            Self::Greedy(player) => player.choose_move(tree, position, rules),
            Self::Exploring(player) => player.choose_move(tree, position, rules),
        }
    }

    fn observe(&mut self, tree: &mut TreeFor<R>, position: &R::Position, rules: &R) -> Result<()> {
        match self {
            Self::Random(player) => TreePlayer::<R>::observe(player, tree, position, rules),
            Self::Greedy(player) => TreePlayer::<R>::observe(player, tree, position, rules),
            Self::Exploring(player) => TreePlayer::<R>::observe(player, tree, position, rules),
        }
    }

    fn on_game_end(&mut self, tree: &mut TreeFor<R>, result: Outcome) -> Result<()> {
        match self {
            Self::Random(player) => TreePlayer::<R>::on_game_end(player, tree, result),
            Self::Greedy(player) => TreePlayer::<R>::on_game_end(player, tree, result),
            Self::Exploring(player) => TreePlayer::<R>::on_game_end(player, tree, result),
        }
    }

    fn records_outcomes(&self) -> bool {
        match self {
            Self::Random(player) => TreePlayer::<R>::records_outcomes(player),
            Self::Greedy(player) => TreePlayer::<R>::records_outcomes(player),
            Self::Exploring(player) => TreePlayer::<R>::records_outcomes(player),
        }
    }

    fn on_shared_game_end(&mut self, result: Outcome) -> Result<()> {
        match self {
            Self::Random(player) => TreePlayer::<R>::on_shared_game_end(player, result),
            Self::Greedy(player) => TreePlayer::<R>::on_shared_game_end(player, result),
            Self::Exploring(player) => TreePlayer::<R>::on_shared_game_end(player, result),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Random(player) => TreePlayer::<R>::name(player),
            Self::Greedy(player) => TreePlayer::<R>::name(player),
            Self::Exploring(player) => TreePlayer::<R>::name(player),
        }
    }

    fn set_rng_seed(&mut self, seed: u64) {
        match self {
            Self::Random(player) => TreePlayer::<R>::set_rng_seed(player, seed),
            Self::Greedy(player) => TreePlayer::<R>::set_rng_seed(player, seed),
            Self::Exploring(player) => TreePlayer::<R>::set_rng_seed(player, seed),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Random(player) => TreePlayer::<R>::reset(player),
            Self::Greedy(player) => TreePlayer::<R>::reset(player),
            Self::Exploring(player) => TreePlayer::<R>::reset(player),
        }
    }
}

pub(crate) fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}
