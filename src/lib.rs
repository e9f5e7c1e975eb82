//! Game-tree learning for two-player, alternating-move games
//!
//! This crate provides:
//! - A shared game tree keyed by position, with win/loss/draw tallies per node
//! - Bounded-depth tree expansion through a pluggable rules engine
//! - Three tree players: random, fixed-depth greedy, and an ε-greedy learner
//! - A game driver and training sessions, single-threaded or over a shared tree
//! - Game records in CSV and a TOML simulation config
//!
//! ```
//! use minitree::{
//!     GameTree, TreePlayer,
//!     games::TakeAway,
//!     players::{GreedyConfig, GreedyTreePlayer},
//! };
//!
//! let game = TakeAway::new(3);
//! let start = game.start(5);
//! let mut tree = GameTree::new(start);
//! let mut player = GreedyTreePlayer::new(GreedyConfig::new(2)).unwrap();
//! // Taking 1 leaves 4 stones, a lost pile for the opponent.
//! assert_eq!(player.choose_move(&mut tree, &start, &game).unwrap(), 1);
//! ```

pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod games;
pub mod players;
pub mod records;
pub mod rules;
pub mod session;
pub mod shared;
pub mod tree;

pub use builder::expand;
pub use config::SimulationConfig;
pub use error::{Error, Result};
pub use players::{
    ExplorationConfig, ExplorationPhase, ExploringPlayer, GreedyConfig, GreedyTreePlayer,
    RandomTreePlayer, Strategy, TreePlayer,
};
pub use records::GameRecord;
pub use rules::{History, Line, Outcome, RulesEngine};
pub use session::{TrainingResults, TrainingSession, TrainingSummary, play_game};
pub use shared::SharedTree;
pub use tree::{GameTree, NodeId, TreeFor, TreeNode, TreeStats};
