//! Analysis module - static images
//!
//! Loads executables and flat dumps so they can be examined without a live
//! process.

pub mod loader;
