//! Shared game tree: one node per position, outcome tallies per node.
//!
//! Nodes live in an arena owned by [`GameTree`] and are addressed by
//! [`NodeId`]. Children point at nodes by id, never by reference, so the
//! structure can hold transpositions and repeated positions without any
//! ownership cycles.

use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Debug, Write as _},
    hash::Hash,
};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    rules::{Outcome, RulesEngine},
};

/// Win probability reported by a node that has never been visited.
pub const NEUTRAL_WIN_PROBABILITY: f64 = 0.5;

/// Index into the node arena of one [`GameTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A position in the tree with its explored moves and outcome tallies.
///
/// Tallies are kept from the point of view of the side that moved into this
/// position.
#[derive(Debug, Clone)]
pub struct TreeNode<P, M> {
    position: P,
    /// Explored moves in insertion order
    children: Vec<(M, NodeId)>,
    visit_count: u64,
    win_count: u64,
    loss_count: u64,
    draw_count: u64,
    terminal: Option<Outcome>,
}

impl<P, M> TreeNode<P, M> {
    fn new(position: P) -> Self {
        Self {
            position,
            children: Vec::new(),
            visit_count: 0,
            win_count: 0,
            loss_count: 0,
            draw_count: 0,
            terminal: None,
        }
    }

    pub fn position(&self) -> &P {
        &self.position
    }

    /// Explored moves and their child nodes, oldest first.
    pub fn children(&self) -> &[(M, NodeId)] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn visit_count(&self) -> u64 {
        self.visit_count
    }

    pub fn win_count(&self) -> u64 {
        self.win_count
    }

    pub fn loss_count(&self) -> u64 {
        self.loss_count
    }

    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    /// Final result if the rules engine reported this position as game over.
    pub fn terminal(&self) -> Option<Outcome> {
        self.terminal
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// `(wins + draws / 2) / visits`, or [`NEUTRAL_WIN_PROBABILITY`] before the
    /// first visit. Computed on every call.
    pub fn win_probability(&self) -> f64 {
        if self.visit_count == 0 {
            return NEUTRAL_WIN_PROBABILITY;
        }
        (self.win_count as f64 + 0.5 * self.draw_count as f64) / self.visit_count as f64
    }

    fn tally(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.win_count += 1,
            Outcome::Loss => self.loss_count += 1,
            Outcome::Draw => self.draw_count += 1,
        }
        self.visit_count += 1;
    }
}

impl<P, M: PartialEq> TreeNode<P, M> {
    /// Child reached by `mv`, if that move has been explored.
    pub fn child(&self, mv: &M) -> Option<NodeId> {
        self.children
            .iter()
            .find(|(candidate, _)| candidate == mv)
            .map(|(_, id)| *id)
    }
}

/// Game tree over the positions and moves of `R`.
pub type TreeFor<R> = GameTree<<R as RulesEngine>::Position, <R as RulesEngine>::Move>;

/// Summary counts over a whole tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub nodes: usize,
    pub edges: usize,
    pub terminal_nodes: usize,
    pub visited_nodes: usize,
    pub root_visits: u64,
}

/// Node table keyed by position, rooted at the starting position.
#[derive(Debug, Clone)]
pub struct GameTree<P, M> {
    nodes: Vec<TreeNode<P, M>>,
    index: HashMap<P, NodeId>,
    root: NodeId,
}

impl<P, M> GameTree<P, M>
where
    P: Clone + Eq + Hash + Debug,
    M: Clone + Eq + Debug,
{
    /// Create a tree holding only a zero-tallied root node.
    pub fn new(root: P) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            root: NodeId(0),
        };
        tree.root = tree.get_or_create_node(&root);
        tree
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &P {
        &self.nodes[self.root.0].position
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree is created with its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this tree.
    pub fn node(&self, id: NodeId) -> &TreeNode<P, M> {
        &self.nodes[id.0]
    }

    pub fn node_id(&self, position: &P) -> Option<NodeId> {
        self.index.get(position).copied()
    }

    /// Look up the node for `position` without creating it.
    pub fn get_node(&self, position: &P) -> Option<&TreeNode<P, M>> {
        self.node_id(position).map(|id| &self.nodes[id.0])
    }

    /// Id of the node for `position`, creating a fresh one if absent.
    pub fn get_or_create_node(&mut self, position: &P) -> NodeId {
        if let Some(id) = self.index.get(position) {
            return *id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode::new(position.clone()));
        self.index.insert(position.clone(), id);
        id
    }

    /// Record that `mv` from `parent` leads to `child`.
    ///
    /// Creates the child node if needed. Adding a move that is already
    /// recorded towards the same child is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] if `parent` has no node, or if
    /// `mv` is already recorded towards a different position.
    pub fn add_child(&mut self, parent: &P, mv: M, child: &P) -> Result<NodeId> {
        let parent_id = self.node_id(parent).ok_or_else(|| Error::InvalidTransition {
            parent: format!("{parent:?}"),
            reason: "parent position has no node".to_string(),
        })?;

        if let Some(existing) = self.nodes[parent_id.0].child(&mv) {
            if self.nodes[existing.0].position == *child {
                return Ok(existing);
            }
            return Err(Error::InvalidTransition {
                parent: format!("{parent:?}"),
                reason: format!(
                    "move {mv:?} already leads to {:?}, not {child:?}",
                    self.nodes[existing.0].position
                ),
            });
        }

        let child_id = self.get_or_create_node(child);
        self.nodes[parent_id.0].children.push((mv, child_id));
        Ok(child_id)
    }

    /// Child node reached from `parent` by `mv`, if recorded.
    pub fn child(&self, parent: &P, mv: &M) -> Option<NodeId> {
        self.get_node(parent).and_then(|node| node.child(mv))
    }

    /// Position reached from `parent` by `mv`, if recorded.
    pub fn child_position(&self, parent: &P, mv: &M) -> Option<&P> {
        self.child(parent, mv).map(|id| &self.nodes[id.0].position)
    }

    /// Flag `position` as game over with `outcome` for the side that moved into it.
    pub fn mark_terminal(&mut self, position: &P, outcome: Outcome) -> Result<()> {
        let id = self
            .node_id(position)
            .ok_or_else(|| Error::unknown_position(position))?;
        self.nodes[id.0].terminal = Some(outcome);
        Ok(())
    }

    /// Tally a finished game along `path`.
    ///
    /// `result` is read from the side that moved into the last position of
    /// the path. Each earlier node gets the result from its own mover's side,
    /// which flips every ply. A node that appears twice in the path is
    /// tallied once.
    ///
    /// The path is checked in full before any tally changes: every position
    /// must have a node and every step must be a recorded move.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPath`], [`Error::UnknownPosition`] or
    /// [`Error::InvalidTransition`]; the tree is untouched in every case.
    pub fn record_outcome(&mut self, path: &[P], result: Outcome) -> Result<()> {
        if path.is_empty() {
            return Err(Error::EmptyPath);
        }

        let ids = path
            .iter()
            .map(|position| {
                self.node_id(position)
                    .ok_or_else(|| Error::unknown_position(position))
            })
            .collect::<Result<Vec<_>>>()?;

        for (step, positions) in ids.windows(2).zip(path.windows(2)) {
            let linked = self.nodes[step[0].0]
                .children
                .iter()
                .any(|(_, child)| *child == step[1]);
            if !linked {
                return Err(Error::InvalidTransition {
                    parent: format!("{:?}", positions[0]),
                    reason: format!("{:?} is not a recorded child", positions[1]),
                });
            }
        }

        let last = ids.len() - 1;
        let mut seen = HashSet::with_capacity(ids.len());
        for (i, id) in ids.into_iter().enumerate() {
            if !seen.insert(id) {
                continue;
            }
            let outcome = if (last - i).is_multiple_of(2) {
                result
            } else {
                result.flipped()
            };
            self.nodes[id.0].tally(outcome);
        }
        Ok(())
    }

    /// All nodes with their ids, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode<P, M>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            nodes: self.nodes.len(),
            root_visits: self.nodes[self.root.0].visit_count,
            ..TreeStats::default()
        };
        for node in &self.nodes {
            stats.edges += node.children.len();
            if node.is_terminal() {
                stats.terminal_nodes += 1;
            }
            if node.visit_count > 0 {
                stats.visited_nodes += 1;
            }
        }
        stats
    }

    /// Verify the structural invariants of every node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptTally`] when a node's visits disagree with its
    /// tallies, and [`Error::InvalidTransition`] for a move recorded twice or a
    /// child id outside the arena.
    pub fn check_invariants(&self) -> Result<()> {
        for node in &self.nodes {
            let tallied = node.win_count + node.loss_count + node.draw_count;
            if node.visit_count != tallied {
                return Err(Error::CorruptTally {
                    position: format!("{:?}", node.position),
                    visits: node.visit_count,
                    tallied,
                });
            }
            for (i, (mv, child)) in node.children.iter().enumerate() {
                if child.0 >= self.nodes.len() {
                    return Err(Error::InvalidTransition {
                        parent: format!("{:?}", node.position),
                        reason: format!("move {mv:?} points outside the tree"),
                    });
                }
                if node.children[..i].iter().any(|(other, _)| other == mv) {
                    return Err(Error::InvalidTransition {
                        parent: format!("{:?}", node.position),
                        reason: format!("move {mv:?} recorded twice"),
                    });
                }
            }
        }
        Ok(())
    }
}

impl<P, M> GameTree<P, M>
where
    P: Clone + Eq + Hash + Debug,
    M: Clone + Eq + Debug + fmt::Display,
{
    /// Indented text view of the subtree under `from`, down to `max_depth`
    /// plies. Returns `None` if `from` has no node.
    ///
    /// ```text
    /// * -> visits 4, p=0.625
    ///   2 -> visits 3, p=0.833
    ///     1 -> visits 1, p=0.000 [win]
    /// ```
    pub fn render(&self, from: &P, max_depth: usize) -> Option<String> {
        let id = self.node_id(from)?;
        let mut out = String::new();
        self.render_node(&mut out, "*", id, 0, max_depth).ok()?;
        Some(out)
    }

    fn render_node(
        &self,
        out: &mut String,
        label: &str,
        id: NodeId,
        depth: usize,
        max_depth: usize,
    ) -> fmt::Result {
        let node = &self.nodes[id.0];
        let marker = match node.terminal {
            Some(Outcome::Win) => " [win]",
            Some(Outcome::Loss) => " [loss]",
            Some(Outcome::Draw) => " [draw]",
            None => "",
        };
        writeln!(
            out,
            "{}{label} -> visits {}, p={:.3}{marker}",
            "  ".repeat(depth),
            node.visit_count,
            node.win_probability()
        )?;
        if depth == max_depth {
            return Ok(());
        }
        for (mv, child) in &node.children {
            self.render_node(out, &mv.to_string(), *child, depth + 1, max_depth)?;
        }
        Ok(())
    }
}
