//! boxamine - examine debuggee memory in a chosen byte order
//!
//! The [`examine`] module is the whole of the byte-order logic and has no
//! idea where memory comes from. Everything else is the host around it: a
//! live-process debugger and memory reader, a static image loader, and the
//! REPL that ties them to the `box` command.

pub mod analysis;
pub mod app;
pub mod core;
pub mod examine;
pub mod ui;
