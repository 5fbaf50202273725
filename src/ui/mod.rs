//! UI module - Command Line Interface
//!
//! Provides the reedline-based REPL and batch command runner.

pub mod cli;
