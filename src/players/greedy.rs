//! Fixed-depth look-ahead over the shared tree.
//!
//! The player expands every continuation of the current position to its
//! configured depth, backs values up minimax-style and plays the move with
//! the best value for itself. Expansion cost is exponential in the depth.

use serde::{Deserialize, Serialize};

use super::TreePlayer;
use crate::{
    Error, Result, builder,
    rules::RulesEngine,
    tree::{GameTree, NodeId, TreeFor},
};

/// Search depth in plies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreedyConfig {
    pub depth: usize,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self { depth: 3 }
    }
}

impl GreedyConfig {
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }

    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(Error::InvalidConfiguration {
                message: "greedy search depth must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Minimax-style player over the shared tree.
#[derive(Debug, Clone)]
pub struct GreedyTreePlayer {
    name: String,
    config: GreedyConfig,
}

impl GreedyTreePlayer {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for a depth of zero.
    pub fn new(config: GreedyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: format!("greedy-d{}", config.depth),
            config,
        })
    }

    pub fn depth(&self) -> usize {
        self.config.depth
    }

    /// Expand around `position` and score every move from it, in the order the
    /// moves were first recorded.
    pub fn move_values<R: RulesEngine>(
        &self,
        tree: &mut TreeFor<R>,
        position: &R::Position,
        rules: &R,
    ) -> Result<Vec<(R::Move, f64)>> {
        builder::expand(tree, position, self.config.depth, rules)?;
        let id = tree
            .node_id(position)
            .ok_or_else(|| Error::unknown_position(position))?;
        let remaining = self.config.depth - 1;
        let tree = &*tree;

        Ok(tree
            .node(id)
            .children()
            .iter()
            .map(|(mv, child)| (mv.clone(), backed_up_value(tree, *child, remaining)))
            .collect())
    }
}

impl<R: RulesEngine> TreePlayer<R> for GreedyTreePlayer {
    fn choose_move(
        &mut self,
        tree: &mut TreeFor<R>,
        position: &R::Position,
        rules: &R,
    ) -> Result<R::Move> {
        if rules.legal_moves(position).is_empty() {
            return Err(Error::no_legal_moves(position));
        }

        let mut best: Option<(R::Move, f64)> = None;
        for (mv, value) in self.move_values(tree, position, rules)? {
            // strict comparison keeps the earliest move on ties
            if best.as_ref().is_none_or(|(_, top)| value > *top) {
                best = Some((mv, value));
            }
        }
        best.map(|(mv, _)| mv)
            .ok_or_else(|| Error::no_legal_moves(position))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Value of node `id` for the side that moved into it, looking `remaining`
/// plies further down.
///
/// Terminal nodes score their outcome exactly. Nodes at the horizon, or not yet
/// expanded, fall back to their win probability from past games. Otherwise
/// the opponent picks the reply that is best for them.
pub fn backed_up_value<P, M>(tree: &GameTree<P, M>, id: NodeId, remaining: usize) -> f64
where
    P: Clone + Eq + std::hash::Hash + std::fmt::Debug,
    M: Clone + Eq + std::fmt::Debug,
{
    let node = tree.node(id);
    if let Some(outcome) = node.terminal() {
        return outcome.value();
    }
    if remaining == 0 || !node.has_children() {
        return node.win_probability();
    }

    let best_reply = node
        .children()
        .iter()
        .map(|(_, child)| backed_up_value(tree, *child, remaining - 1))
        .fold(f64::NEG_INFINITY, f64::max);
    1.0 - best_reply
}
