//! Byte-Order Converter
//!
//! Rewrites a textual memory dump so that every word is shown in the
//! requested byte order. Address labels and line structure pass through
//! untouched; only the byte order inside each word changes.

use std::fmt;

use super::error::ExamineError;
use super::format::{Endianness, FormatDescriptor, UnitSize};

/// Character closing an address label such as `0x1000:` or `0x1000 <main+4>:`
pub const LABEL_TERMINATOR: char = ':';

/// One fixed-width hexadecimal word of a dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexWord {
    /// `0x`, `0X` or empty
    prefix: &'static str,
    /// Bytes in display order (most significant digit pair first)
    bytes: Vec<u8>,
    uppercase: bool,
}

impl HexWord {
    /// Parse a dump field, requiring exactly `unit_size` bytes of hex digits
    pub fn parse(field: &str, unit_size: UnitSize) -> Result<Self, ExamineError> {
        let (prefix, digits) = if let Some(d) = field.strip_prefix("0x") {
            ("0x", d)
        } else if let Some(d) = field.strip_prefix("0X") {
            ("0X", d)
        } else {
            ("", field)
        };

        let bytes = hex::decode(digits).map_err(|e| match e {
            hex::FromHexError::OddLength => {
                ExamineError::conversion(field, "odd number of hex digits")
            }
            hex::FromHexError::InvalidHexCharacter { c, .. } => {
                ExamineError::conversion(field, format!("'{}' is not a hex digit", c))
            }
            other => ExamineError::conversion(field, other.to_string()),
        })?;

        if bytes.len() != unit_size.bytes() {
            return Err(ExamineError::conversion(
                field,
                format!(
                    "expected {} hex digits for a {}, found {}",
                    unit_size.hex_digits(),
                    unit_size,
                    digits.len()
                ),
            ));
        }

        Ok(Self {
            prefix,
            bytes,
            uppercase: digits.chars().any(|c| c.is_ascii_uppercase()),
        })
    }

    /// Build a `0x`-prefixed word from raw memory laid out in `order`
    pub fn from_memory(raw: &[u8], order: Endianness) -> Self {
        let mut bytes = raw.to_vec();
        if order == Endianness::Little {
            bytes.reverse();
        }
        Self {
            prefix: "0x",
            bytes,
            uppercase: false,
        }
    }

    /// The same word with its byte pairs in reverse order
    pub fn reversed(&self) -> Self {
        let mut bytes = self.bytes.clone();
        bytes.reverse();
        Self {
            prefix: self.prefix,
            bytes,
            uppercase: self.uppercase,
        }
    }
}

impl fmt::Display for HexWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = if self.uppercase {
            hex::encode_upper(&self.bytes)
        } else {
            hex::encode(&self.bytes)
        };
        write!(f, "{}{}", self.prefix, digits)
    }
}

/// One line of a dump: an optional label followed by words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpLine {
    pub label: Option<String>,
    pub words: Vec<HexWord>,
}

impl DumpLine {
    pub fn new(label: Option<String>, words: Vec<HexWord>) -> Self {
        Self { label, words }
    }

    /// Parse a single non-blank line
    pub fn parse(line: &str, unit_size: UnitSize) -> Result<Self, ExamineError> {
        let (label, rest) = split_label(line.trim());
        let words = rest
            .split_whitespace()
            .map(|field| HexWord::parse(field, unit_size))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            label: label.map(str::to_string),
            words,
        })
    }

    /// Copy of this line with every word byte-reversed
    pub fn reversed(&self) -> Self {
        Self {
            label: self.label.clone(),
            words: self.words.iter().map(HexWord::reversed).collect(),
        }
    }
}

impl fmt::Display for DumpLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        if let Some(label) = &self.label {
            f.write_str(label)?;
            first = false;
        }
        for word in &self.words {
            if !first {
                f.write_str("\t")?;
            }
            write!(f, "{}", word)?;
            first = false;
        }
        Ok(())
    }
}

/// Split off everything up to and including the first field ending in `:`
fn split_label(line: &str) -> (Option<&str>, &str) {
    let mut search = 0;
    while let Some(pos) = line[search..].find(LABEL_TERMINATOR) {
        let end = search + pos + LABEL_TERMINATOR.len_utf8();
        let at_field_end = line[end..].chars().next().map_or(true, char::is_whitespace);
        if at_field_end {
            return (Some(&line[..end]), &line[end..]);
        }
        search = end;
    }
    (None, line)
}

/// Parse dump text into lines, skipping blank ones
pub fn parse_dump(text: &str, unit_size: UnitSize) -> Result<Vec<DumpLine>, ExamineError> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| DumpLine::parse(line, unit_size))
        .collect()
}

/// Render lines back to text, each terminated by `newline`
pub fn render_dump(lines: &[DumpLine], newline: &str) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.to_string());
        out.push_str(newline);
    }
    out
}

/// Re-emit `dump_text` in the byte order requested by `descriptor`.
///
/// When the requested order already is the native one the text is returned
/// as is. Otherwise every word is byte-reversed; the result is all or
/// nothing, a single malformed word fails the whole conversion.
pub fn convert(
    descriptor: &FormatDescriptor,
    native: Endianness,
    dump_text: &str,
) -> Result<String, ExamineError> {
    if descriptor.endianness == native {
        return Ok(dump_text.to_string());
    }

    log::debug!(
        "converting {} dump from {} to {} endian",
        descriptor.unit_size,
        native,
        descriptor.endianness
    );

    let newline = if dump_text.contains("\r\n") { "\r\n" } else { "\n" };
    let lines = parse_dump(dump_text, descriptor.unit_size)?;
    let converted: Vec<DumpLine> = lines.iter().map(DumpLine::reversed).collect();

    Ok(render_dump(&converted, newline))
}
