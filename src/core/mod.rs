//! Core module - Debugger backend and low-level operations
//!
//! This module contains the platform-specific debugger implementations,
//! memory access, and the `x`-style dump formatter.

pub mod debugger;
pub mod dump;
pub mod memory;
