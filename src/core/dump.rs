//! Dump - the `x` command's text output
//!
//! [`DumpReader`] resolves an address expression against a [`MemorySource`],
//! reads the requested words and prints them the way gdb's `x/Nx` does:
//!
//! ```text
//! 0x401000 <main>:     0x464c457f  0x00010102  0x00000000  0x00000000
//! ```

use super::memory::{MemoryError, MemorySource};
use crate::examine::convert::render_dump;
use crate::examine::{DumpLine, Endianness, ExamineRequest, HexWord, MemoryReader, UnitSize};

/// Words printed on one line for each unit size
pub fn words_per_line(unit_size: UnitSize) -> usize {
    match unit_size {
        UnitSize::Byte | UnitSize::Halfword => 8,
        UnitSize::Word => 4,
        UnitSize::Giant => 2,
    }
}

/// Formats target memory as dump text, words in the target's byte order
pub struct DumpReader<'a> {
    source: &'a dyn MemorySource,
    order: Endianness,
}

impl<'a> DumpReader<'a> {
    pub fn new(source: &'a dyn MemorySource, order: Endianness) -> Self {
        Self { source, order }
    }

    fn label(&self, address: u64) -> String {
        match self.source.symbolize(address) {
            Some(sym) => format!("{:#x} <{}>:", address, sym),
            None => format!("{:#x}:", address),
        }
    }
}

impl MemoryReader for DumpReader<'_> {
    fn examine(&mut self, request: &ExamineRequest) -> Result<String, MemoryError> {
        let address = evaluate(&request.address_expr, self.source)?;
        let unit = request.unit_size.bytes();
        let total = (request.count as usize)
            .checked_mul(unit)
            .filter(|total| address.checked_add(*total as u64).is_some())
            .ok_or(MemoryError::Unmapped { address })?;

        log::debug!(
            "x/{}x{} at {:#x} ({} bytes)",
            request.count,
            request.unit_size.letter(),
            address,
            total
        );
        let data = self.source.read(address, total)?;

        let line_bytes = words_per_line(request.unit_size) * unit;
        let lines: Vec<DumpLine> = data
            .chunks(line_bytes)
            .enumerate()
            .map(|(i, chunk)| {
                let line_address = address + (i * line_bytes) as u64;
                let words = chunk
                    .chunks(unit)
                    .map(|word| HexWord::from_memory(word, self.order))
                    .collect();
                DumpLine::new(Some(self.label(line_address)), words)
            })
            .collect();

        Ok(render_dump(&lines, "\n"))
    }
}

/// Evaluate `term (('+'|'-') term)*` where a term is a hex literal, a decimal
/// literal or a symbol the source knows.
pub fn evaluate(expr: &str, source: &dyn MemorySource) -> Result<u64, MemoryError> {
    let bad = |reason: String| MemoryError::BadExpression {
        expr: expr.to_string(),
        reason,
    };

    let mut rest = expr.trim();
    let mut value: u64 = 0;
    let mut op = '+';

    loop {
        let end = rest
            .find(|c: char| c == '+' || c == '-')
            .unwrap_or(rest.len());
        let term = rest[..end].trim();
        if term.is_empty() {
            return Err(bad(format!("missing operand before '{}'", &rest[end..])));
        }

        let operand = evaluate_term(term, source)
            .ok_or_else(|| bad(format!("no symbol or number \"{}\"", term)))?;
        value = match op {
            '+' => value.checked_add(operand),
            _ => value.checked_sub(operand),
        }
        .ok_or_else(|| bad("address out of range".into()))?;

        let Some(next) = rest[end..].chars().next() else {
            break;
        };
        op = next;
        rest = &rest[end + next.len_utf8()..];
    }

    log::trace!("'{}' evaluates to {:#x}", expr, value);
    Ok(value)
}

fn evaluate_term(term: &str, source: &dyn MemorySource) -> Option<u64> {
    if let Some(hex) = term.strip_prefix("0x").or_else(|| term.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok();
    }
    if term.chars().all(|c| c.is_ascii_digit()) {
        return term.parse().ok();
    }
    source.resolve_symbol(term)
}
