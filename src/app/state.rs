//! Session state
//!
//! What one interactive session knows about its target: an attached process,
//! a loaded image, and the user's endianness setting. The target's byte
//! order is derived from these on every command, never remembered.

use std::fmt;

use crate::analysis::loader::LoadedBinary;
use crate::core::debugger::Debugger;
use crate::core::dump::DumpReader;
use crate::core::memory::{MemoryError, MemorySource};
use crate::examine::{self, Endianness, ExamineError, ExamineRequest, MemoryReader};

/// The `endian` setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum EndianSetting {
    /// Follow the attached process or loaded image
    #[default]
    Auto,
    Little,
    Big,
}

impl EndianSetting {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "little" => Some(Self::Little),
            "big" => Some(Self::Big),
            _ => None,
        }
    }
}

impl fmt::Display for EndianSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Little => "little",
            Self::Big => "big",
        })
    }
}

/// Shared session state
#[derive(Default)]
pub struct Session {
    /// Live process, if attached
    pub debugger: Debugger,
    /// Image loaded with `open` or `raw`
    pub binary: Option<LoadedBinary>,
    /// User's endianness setting
    pub endian: EndianSetting,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Byte order of the current target.
    ///
    /// An attached process runs on this machine, so it shares the host's
    /// order; an image carries its own in its header.
    pub fn native_endianness(&self) -> Result<Endianness, ExamineError> {
        match self.endian {
            EndianSetting::Little => Ok(Endianness::Little),
            EndianSetting::Big => Ok(Endianness::Big),
            EndianSetting::Auto if self.debugger.is_active() => Ok(Endianness::host()),
            EndianSetting::Auto => self
                .binary
                .as_ref()
                .and_then(|b| b.endianness)
                .ok_or(ExamineError::EndiannessUnknown),
        }
    }

    /// Where `x` and `box` read from: the process first, then the image
    pub fn source(&self) -> Result<&dyn MemorySource, MemoryError> {
        if self.debugger.is_active() {
            return Ok(self.debugger.memory());
        }
        match &self.binary {
            Some(binary) => Ok(binary),
            None => Err(MemoryError::NoSource),
        }
    }

    /// `box[/FMT] ADDR`
    pub fn examine_converted(&self, raw_args: &str) -> Result<String, ExamineError> {
        let native = self.native_endianness()?;
        let mut reader = DumpReader::new(self.source()?, native);
        examine::handle(raw_args, native, &mut reader)
    }

    /// `x[/FMT] ADDR`: same grammar, output left in the target's order
    pub fn examine_raw(&self, raw_args: &str) -> Result<String, ExamineError> {
        let native = self.native_endianness()?;
        let (descriptor, address_expr) = examine::parse(raw_args, native)?;
        let mut reader = DumpReader::new(self.source()?, native);
        let dump = reader.examine(&ExamineRequest {
            count: descriptor.count,
            unit_size: descriptor.unit_size,
            address_expr,
        })?;
        Ok(dump)
    }

    /// Text for `endian` with no argument, worded like gdb's `show endian`
    pub fn describe_endian(&self) -> String {
        match self.endian {
            EndianSetting::Auto => match self.native_endianness() {
                Ok(order) => format!(
                    "The target endianness is set automatically (currently {} endian)",
                    order
                ),
                Err(_) => "The target endianness is set automatically (currently unknown)".into(),
            },
            fixed => format!("The target is assumed to be {} endian", fixed),
        }
    }

    /// One-paragraph status for `info`
    pub fn describe(&self) -> String {
        let mut out = String::new();
        match self.debugger.target_pid() {
            Some(pid) => out.push_str(&format!("Attached to process {}\n", pid)),
            None => out.push_str("No process attached\n"),
        }
        match &self.binary {
            Some(binary) => {
                out.push_str(&format!("Image: {}\n", binary.path));
                out.push_str(&binary.summary());
                out.push('\n');
            }
            None => out.push_str("No image loaded\n"),
        }
        out.push_str(&self.describe_endian());
        out.push('\n');
        out
    }
}
