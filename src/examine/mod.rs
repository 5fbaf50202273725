//! Examine module - memory dumps in a chosen byte order
//!
//! The `box` command: parse a `/FMT` token, ask a [`MemoryReader`] for the
//! dump, and re-emit it in the requested byte order.
//! - `format`: the `[/][count][size][endian]` parser
//! - `convert`: per-word byte reversal over dump text
//!
//! Nothing here knows where memory comes from; the host passes in a reader
//! and the target's native byte order on every call.

pub mod convert;
pub mod error;
pub mod format;

#[cfg(test)]
mod tests;

pub use convert::{convert, DumpLine, HexWord};
pub use error::ExamineError;
pub use format::{parse, Endianness, FormatDescriptor, UnitSize};

use crate::core::memory::MemoryError;

/// What the memory-read collaborator is asked to dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamineRequest {
    pub count: u32,
    pub unit_size: UnitSize,
    /// Forwarded verbatim; the reader decides what it means
    pub address_expr: String,
}

/// Produces textual dumps: lines of an optional `ADDR:` label followed by
/// whitespace-separated fixed-width hex words in the target's byte order.
pub trait MemoryReader {
    fn examine(&mut self, request: &ExamineRequest) -> Result<String, MemoryError>;
}

/// Run one `box` invocation: `raw_args` is everything after the command name.
pub fn handle(
    raw_args: &str,
    native: Endianness,
    reader: &mut dyn MemoryReader,
) -> Result<String, ExamineError> {
    let (descriptor, address_expr) = parse(raw_args, native)?;

    let request = ExamineRequest {
        count: descriptor.count,
        unit_size: descriptor.unit_size,
        address_expr,
    };
    let dump = reader.examine(&request)?;

    convert(&descriptor, native, &dump)
}
