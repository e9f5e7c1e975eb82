//! Command-line front end for running simulations on the built-in take-away
//! game.

pub mod commands;
pub mod output;
