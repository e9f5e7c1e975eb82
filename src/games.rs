//! Small rules engines shipped with the crate.
//!
//! Neither is Minichess. They exist so the tree players can be driven from the
//! command line and exercised in tests without an external rules engine.

pub mod scripted;
pub mod takeaway;

pub use scripted::ScriptedGame;
pub use takeaway::{Pile, TakeAway};
