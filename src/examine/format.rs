//! Format Parser - `[/][count][size][endian]` tokens
//!
//! Turns the argument of a `box` command into a [`FormatDescriptor`] and the
//! address expression that follows it. Size and endianness letters are
//! canonicalized into two disjoint enums here, so nothing downstream ever
//! looks at the raw letters again.

use std::fmt;

use super::error::ExamineError;

/// Byte order of a word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    /// Least significant byte at the lowest address
    Little,
    /// Most significant byte at the lowest address
    Big,
}

impl Endianness {
    /// Byte order of the machine running this process
    pub fn host() -> Self {
        if cfg!(target_endian = "little") {
            Self::Little
        } else {
            Self::Big
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Little => "little",
            Self::Big => "big",
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Width of one word in a memory dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitSize {
    /// 1 byte (`b`)
    Byte,
    /// 2 bytes (`h`)
    Halfword,
    /// 4 bytes (`w`)
    Word,
    /// 8 bytes (`g`)
    Giant,
}

impl UnitSize {
    /// Number of bytes in one word
    pub fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Halfword => 2,
            Self::Word => 4,
            Self::Giant => 8,
        }
    }

    /// Number of hex digits needed to print one word
    pub fn hex_digits(self) -> usize {
        self.bytes() * 2
    }

    /// Format letter understood by `x` and `box`
    pub fn letter(self) -> char {
        match self {
            Self::Byte => 'b',
            Self::Halfword => 'h',
            Self::Word => 'w',
            Self::Giant => 'g',
        }
    }
}

impl fmt::Display for UnitSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Byte => "byte",
            Self::Halfword => "halfword",
            Self::Word => "word",
            Self::Giant => "giant",
        };
        f.write_str(name)
    }
}

/// Parsed `/FMT` token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Number of words to examine (always >= 1)
    pub count: u32,
    /// Width of each word
    pub unit_size: UnitSize,
    /// Byte order to display the words in
    pub endianness: Endianness,
}

impl FormatDescriptor {
    /// `1w` in the native byte order
    pub fn with_defaults(native: Endianness) -> Self {
        Self {
            count: 1,
            unit_size: UnitSize::Word,
            endianness: native,
        }
    }
}

/// A format letter after canonicalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Letter {
    Size(UnitSize),
    Endian(Endianness),
}

impl Letter {
    /// Map a raw letter onto exactly one axis.
    ///
    /// Size letters are accepted in either case. `b` is the only letter both
    /// axes share. It means Byte unless the token is written in the lowercase
    /// endianness dialect (it contains `l`), where it means Big. Uppercase `B`
    /// is always Big.
    fn canonicalize(c: char, lowercase_dialect: bool) -> Option<Self> {
        let letter = match c {
            'b' if lowercase_dialect => Self::Endian(Endianness::Big),
            'b' => Self::Size(UnitSize::Byte),
            'h' | 'H' => Self::Size(UnitSize::Halfword),
            'w' | 'W' => Self::Size(UnitSize::Word),
            'g' | 'G' => Self::Size(UnitSize::Giant),
            'l' | 'L' => Self::Endian(Endianness::Little),
            'B' => Self::Endian(Endianness::Big),
            _ => return None,
        };
        Some(letter)
    }
}

/// Parse the argument of a `box` command.
///
/// Returns the descriptor and the address expression, trimmed. Without a
/// leading `/` the whole input is the address expression and the defaults
/// (`1w`, native order) apply.
pub fn parse(input: &str, native: Endianness) -> Result<(FormatDescriptor, String), ExamineError> {
    let input = input.trim();

    let Some(rest) = input.strip_prefix('/') else {
        log::trace!("no format token, using defaults for '{}'", input);
        return Ok((FormatDescriptor::with_defaults(native), address_expression(input)?));
    };

    let (token, remainder) = match rest.find(char::is_whitespace) {
        Some(pos) => rest.split_at(pos),
        None => (rest, ""),
    };

    let descriptor = parse_token(token, native)
        .map_err(|reason| ExamineError::format(&format!("/{}", token), reason))?;
    log::debug!("parsed format /{} as {:?}", token, descriptor);

    Ok((descriptor, address_expression(remainder)?))
}

fn address_expression(s: &str) -> Result<String, ExamineError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ExamineError::AddressExpressionMissing);
    }
    Ok(s.to_string())
}

/// Parse the body of a format token (everything after the `/`)
fn parse_token(token: &str, native: Endianness) -> Result<FormatDescriptor, String> {
    let split = token
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(token.len());
    let (count_str, letters) = token.split_at(split);

    let count = parse_count(count_str)?;

    let lowercase_dialect = letters.contains('l');
    let mut size: Option<(char, UnitSize)> = None;
    let mut endian: Option<(char, Endianness)> = None;

    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(format!("unexpected '{}' after format letters", c));
        }

        match Letter::canonicalize(c, lowercase_dialect) {
            Some(Letter::Size(unit)) => {
                if let Some((prev, _)) = size {
                    return Err(format!("two size letters ('{}' and '{}')", prev, c));
                }
                size = Some((c, unit));
            }
            Some(Letter::Endian(order)) => {
                if let Some((prev, _)) = endian {
                    return Err(format!("two endianness letters ('{}' and '{}')", prev, c));
                }
                endian = Some((c, order));
            }
            None => {
                return Err(format!(
                    "unknown letter '{}' (size: b, h/H, w/W, g/G; endianness: l/L, b, B)",
                    c
                ))
            }
        }
    }

    Ok(FormatDescriptor {
        count,
        unit_size: size.map(|(_, unit)| unit).unwrap_or(UnitSize::Word),
        endianness: endian.map(|(_, order)| order).unwrap_or(native),
    })
}

fn parse_count(s: &str) -> Result<u32, String> {
    if s.is_empty() {
        return Ok(1);
    }
    if s.starts_with('-') {
        return Err(format!("repeat count {} must be positive", s));
    }

    let count: u32 = s.parse().map_err(|_| {
        if s.chars().all(|c| c.is_ascii_digit()) {
            format!("repeat count {} is too large", s)
        } else {
            format!("repeat count '{}' is not a number", s)
        }
    })?;

    if count == 0 {
        return Err("repeat count must be positive".into());
    }
    Ok(count)
}
