//! App module - session state and commands
//!
//! Holds what the session knows about its target and parses user input.

mod commands;
mod state;

pub use commands::*;
pub use state::*;
