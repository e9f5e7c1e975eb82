//! Uniform random play guided by the moves already recorded in the tree.

use rand::{prelude::IndexedRandom, rngs::StdRng};

use super::{TreePlayer, build_rng};
use crate::{Error, Result, rules::RulesEngine, tree::TreeFor};

/// Picks uniformly among the recorded children of the current position, or
/// among all legal moves when the tree knows nothing about it.
///
/// Never modifies the tree.
#[derive(Debug, Clone)]
pub struct RandomTreePlayer {
    name: String,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl RandomTreePlayer {
    pub fn new() -> Self {
        Self {
            name: "random-tree".to_string(),
            rng: build_rng(None),
            rng_seed: None,
        }
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
}

impl Default for RandomTreePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RulesEngine> TreePlayer<R> for RandomTreePlayer {
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

        if let Some(node) = tree.get_node(position)
            && let Some((mv, _)) = node.children().choose(&mut self.rng)
        {
            return Ok(mv.clone());
        }

        legal
            .choose(&mut self.rng)
            .cloned()
            .ok_or_else(|| Error::no_legal_moves(position))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = build_rng(Some(seed));
        self.rng_seed = Some(seed);
    }

    fn reset(&mut self) {
        self.rng = build_rng(self.rng_seed);
    }
}
