//! Bounded-depth tree expansion driven by the rules engine.

use tracing::debug;

use crate::{Result, rules::RulesEngine, tree::TreeFor};

/// Make sure every position within `depth` plies of `from` is in `tree`.
///
/// Missing nodes are generated with `legal_moves` and `apply_move`; moves that
/// are already recorded are followed without asking the rules engine to
/// replay them. Terminal positions are marked and never expanded further.
/// With `depth == 0` only `from` itself is created (if absent).
///
/// Cost grows with `branching_factor ^ depth`; keep `depth` small for real games.
///
/// Returns the number of nodes created.
pub fn expand<R: RulesEngine>(
    tree: &mut TreeFor<R>,
    from: &R::Position,
    depth: usize,
    rules: &R,
) -> Result<usize> {
    let before = tree.len();
    tree.get_or_create_node(from);
    expand_node(tree, from, depth, rules)?;

    let created = tree.len() - before;
    debug!(depth, created, total = tree.len(), "expanded game tree");
    Ok(created)
}

fn expand_node<R: RulesEngine>(
    tree: &mut TreeFor<R>,
    position: &R::Position,
    depth: usize,
    rules: &R,
) -> Result<()> {
    if let Some(outcome) = rules.outcome(position) {
        return tree.mark_terminal(position, outcome);
    }
    if depth == 0 {
        return Ok(());
    }

    for mv in rules.legal_moves(position) {
        let next = match tree.child_position(position, &mv) {
            Some(known) => known.clone(),
            None => rules.apply_move(position, &mv)?,
        };
        tree.add_child(position, mv, &next)?;
        expand_node(tree, &next, depth - 1, rules)?;
    }
    Ok(())
}
