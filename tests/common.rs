//! Shared scenarios for the integration tests.

#![allow(dead_code)]

use minitree::{GameTree, NodeId, Outcome, games::ScriptedGame};

/// `P0` with one immediately winning move and one immediately losing move.
pub fn win_or_lose() -> ScriptedGame {
    ScriptedGame::new("P0")
        .edge("P0", "m1", "P1")
        .edge("P0", "m2", "P2")
        .terminal("P1", Outcome::Win)
        .terminal("P2", Outcome::Loss)
}

/// Three first moves, each answered by an opponent who picks between a
/// winning and a losing reply. Outcomes are from the side that moved last,
/// so a "win" under an opponent node is the opponent's win.
///
/// - `a`: both replies win for the opponent
/// - `b`: one reply wins, one loses for the opponent
/// - `c`: both replies lose for the opponent
pub fn three_openings() -> ScriptedGame {
    ScriptedGame::new("root")
        .edge("root", "a", "A")
        .edge("root", "b", "B")
        .edge("root", "c", "C")
        .edge("A", "x", "AX")
        .edge("A", "y", "AY")
        .edge("B", "x", "BX")
        .edge("B", "y", "BY")
        .edge("C", "x", "CX")
        .edge("C", "y", "CY")
        .terminal("AX", Outcome::Win)
        .terminal("AY", Outcome::Win)
        .terminal("BX", Outcome::Win)
        .terminal("BY", Outcome::Loss)
        .terminal("CX", Outcome::Loss)
        .terminal("CY", Outcome::Loss)
}

pub fn s(value: &str) -> String {
    value.to_string()
}

/// The move an exploiting player takes from `parent`: highest win
/// probability, then fewest visits, then first recorded.
pub fn expected_exploit(tree: &GameTree<String, String>, parent: NodeId) -> Option<String> {
    let mut best: Option<(&String, f64, u64)> = None;
    for (mv, child) in tree.node(parent).children() {
        let node = tree.node(*child);
        let p = node.win_probability();
        let visits = node.visit_count();
        let better = match best {
            None => true,
            Some((_, top, top_visits)) => p > top || (p == top && visits < top_visits),
        };
        if better {
            best = Some((mv, p, visits));
        }
    }
    best.map(|(mv, _, _)| mv.clone())
}
