//! Take-away: players alternately remove stones from a pile and whoever takes
//! the last stone wins.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    rules::{Outcome, RulesEngine},
};

/// Pile state plus the seat (0 or 1) that moves next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pile {
    pub stones: u32,
    pub to_move: u8,
}

impl fmt::Display for Pile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stones, seat {} to move", self.stones, self.to_move)
    }
}

/// Take-away rules with a configurable maximum take per turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeAway {
    max_take: u32,
}

impl TakeAway {
    /// Create the rules. A `max_take` of zero is treated as one.
    pub fn new(max_take: u32) -> Self {
        Self {
            max_take: max_take.max(1),
        }
    }

    pub fn max_take(&self) -> u32 {
        self.max_take
    }

    /// Starting pile with seat 0 to move.
    pub fn start(&self, stones: u32) -> Pile {
        Pile { stones, to_move: 0 }
    }
}

impl Default for TakeAway {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RulesEngine for TakeAway {
    type Position = Pile;
    type Move = u32;

    fn legal_moves(&self, position: &Pile) -> Vec<u32> {
        (1..=self.max_take.min(position.stones)).collect()
    }

    fn apply_move(&self, position: &Pile, mv: &u32) -> Result<Pile> {
        if *mv == 0 || *mv > self.max_take || *mv > position.stones {
            return Err(Error::illegal_move(mv, position));
        }
        Ok(Pile {
            stones: position.stones - mv,
            to_move: 1 - position.to_move,
        })
    }

    fn outcome(&self, position: &Pile) -> Option<Outcome> {
        (position.stones == 0).then_some(Outcome::Win)
    }
}
