//! Game graph declared edge by edge.
//!
//! Handy for pinning down exact scenarios: which moves exist, where they lead
//! and how each leaf ends.

use std::collections::HashMap;

use crate::{
    Error, Result,
    rules::{Outcome, RulesEngine},
};

/// Explicit game graph over named positions and moves.
///
/// Every position without outgoing edges should be declared terminal.
///
/// # Examples
///
/// ```
/// use minitree::games::ScriptedGame;
/// use minitree::rules::{Outcome, RulesEngine};
///
/// let game = ScriptedGame::new("P0")
///     .edge("P0", "m1", "P1")
///     .edge("P0", "m2", "P2")
///     .terminal("P1", Outcome::Win)
///     .terminal("P2", Outcome::Loss);
///
/// assert_eq!(game.legal_moves(&"P0".to_string()), vec!["m1", "m2"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedGame {
    start: String,
    edges: HashMap<String, Vec<(String, String)>>,
    terminals: HashMap<String, Outcome>,
}

impl ScriptedGame {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            ..Self::default()
        }
    }

    /// Declare that `mv` leads from `from` to `to`. Moves keep declaration order.
    pub fn edge(
        mut self,
        from: impl Into<String>,
        mv: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.edges
            .entry(from.into())
            .or_default()
            .push((mv.into(), to.into()));
        self
    }

    /// Declare `position` terminal with `outcome` for the side that moved into it.
    pub fn terminal(mut self, position: impl Into<String>, outcome: Outcome) -> Self {
        self.terminals.insert(position.into(), outcome);
        self
    }

    pub fn start(&self) -> String {
        self.start.clone()
    }
}

impl RulesEngine for ScriptedGame {
    type Position = String;
    type Move = String;

    fn legal_moves(&self, position: &String) -> Vec<String> {
        if self.terminals.contains_key(position) {
            return Vec::new();
        }
        self.edges
            .get(position)
            .map(|edges| edges.iter().map(|(mv, _)| mv.clone()).collect())
            .unwrap_or_default()
    }

    fn apply_move(&self, position: &String, mv: &String) -> Result<String> {
        if self.terminals.contains_key(position) {
            return Err(Error::illegal_move(mv, position));
        }
        self.edges
            .get(position)
            .and_then(|edges| edges.iter().find(|(candidate, _)| candidate == mv))
            .map(|(_, to)| to.clone())
            .ok_or_else(|| Error::illegal_move(mv, position))
    }

    fn outcome(&self, position: &String) -> Option<Outcome> {
        self.terminals.get(position).copied()
    }
}
