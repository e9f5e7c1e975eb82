//! Rules engine boundary.
//!
//! The tree engine never looks inside a position. Everything it knows about a
//! game comes through [`RulesEngine`]: which moves are legal, where a move
//! leads, and whether a position ends the game.

use std::{fmt::Debug, hash::Hash};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Result of a finished game.
///
/// Outcomes attached to a position are always read from the side that made
/// the move leading into that position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// The same result seen by the other side.
    pub fn flipped(self) -> Self {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
        }
    }

    /// Score used by the greedy backup: 1 for a win, 0 for a loss, 0.5 for a draw.
    pub fn value(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => 0.0,
            Outcome::Draw => 0.5,
        }
    }
}

/// Game rules consumed by the tree engine and the players.
///
/// Implementations must keep `legal_moves` empty exactly at terminal positions,
/// which are the positions where `outcome` returns `Some`.
pub trait RulesEngine {
    /// Opaque game state, used as a lookup key.
    type Position: Clone + Eq + Hash + Debug;
    /// Opaque transition between two positions.
    type Move: Clone + Eq + Hash + Debug;

    /// Legal moves from `position`, in a stable order.
    fn legal_moves(&self, position: &Self::Position) -> Vec<Self::Move>;

    /// Play `mv` from `position`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::IllegalMove`] if `mv` is not legal in `position`.
    fn apply_move(&self, position: &Self::Position, mv: &Self::Move) -> Result<Self::Position>;

    /// Final result of `position` for the side that moved into it, or `None`
    /// while the game is still running.
    fn outcome(&self, position: &Self::Position) -> Option<Outcome>;

    fn is_terminal(&self, position: &Self::Position) -> bool {
        self.outcome(position).is_some()
    }
}

/// A position paired with the moves that reached it from the start.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Line<P, M> {
    position: P,
    moves: Vec<M>,
}

impl<P, M> Line<P, M> {
    /// The starting position with an empty move list.
    pub fn root(position: P) -> Self {
        Self {
            position,
            moves: Vec::new(),
        }
    }

    pub fn position(&self) -> &P {
        &self.position
    }

    pub fn moves(&self) -> &[M] {
        &self.moves
    }

    /// Number of moves played since the start.
    pub fn ply(&self) -> usize {
        self.moves.len()
    }
}

/// Adapter that identifies positions by their move sequence.
///
/// Two move orders that transpose into the same board produce distinct
/// [`Line`]s, so a tree built through `History` keeps one node per path.
#[derive(Debug, Clone, Default)]
pub struct History<R> {
    inner: R,
}

impl<R: RulesEngine> History<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Wrap a starting position of the inner game.
    pub fn start(&self, position: R::Position) -> Line<R::Position, R::Move> {
        Line::root(position)
    }
}

impl<R: RulesEngine> RulesEngine for History<R> {
    type Position = Line<R::Position, R::Move>;
    type Move = R::Move;

    fn legal_moves(&self, position: &Self::Position) -> Vec<Self::Move> {
        self.inner.legal_moves(&position.position)
    }

    fn apply_move(&self, position: &Self::Position, mv: &Self::Move) -> Result<Self::Position> {
        let next = self.inner.apply_move(&position.position, mv)?;
        let mut moves = Vec::with_capacity(position.moves.len() + 1);
        moves.extend_from_slice(&position.moves);
        moves.push(mv.clone());
        Ok(Line {
            position: next,
            moves,
        })
    }

    fn outcome(&self, position: &Self::Position) -> Option<Outcome> {
        self.inner.outcome(&position.position)
    }
}
