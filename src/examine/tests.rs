//! End-to-end checks for the `box` pipeline with a scripted reader

use super::{convert, handle, Endianness, ExamineError, ExamineRequest, FormatDescriptor, MemoryReader, UnitSize};
use crate::core::memory::MemoryError;

/// Returns canned text and remembers what it was asked for
struct ScriptedReader {
    dump: Result<String, String>,
    requests: Vec<ExamineRequest>,
}

impl ScriptedReader {
    fn new(dump: &str) -> Self {
        Self {
            dump: Ok(dump.to_string()),
            requests: Vec::new(),
        }
    }

    fn failing(reason: &str) -> Self {
        Self {
            dump: Err(reason.to_string()),
            requests: Vec::new(),
        }
    }
}

impl MemoryReader for ScriptedReader {
    fn examine(&mut self, request: &ExamineRequest) -> Result<String, MemoryError> {
        self.requests.push(request.clone());
        self.dump.clone().map_err(|reason| MemoryError::ReadFailed {
            address: 0,
            reason,
        })
    }
}

/// One word of each size, as the `x` command would print it
const SAMPLES: &[(UnitSize, &str)] = &[
    (UnitSize::Byte, "0x1000:\t0x7f\t0x45\t0x4c\t0x46\n"),
    (UnitSize::Halfword, "0x1000:\t0x457f\t0x464c\n"),
    (UnitSize::Word, "0x1000:\t0x464c457f\t0x00010102\n"),
    (UnitSize::Giant, "0x1000:\t0x00010102464c457f\n"),
];

#[test]
fn test_round_trip_all_sizes() {
    for &(unit_size, dump) in SAMPLES {
        let to_big = FormatDescriptor {
            count: 1,
            unit_size,
            endianness: Endianness::Big,
        };
        let to_little = FormatDescriptor {
            endianness: Endianness::Little,
            ..to_big
        };

        let once = convert(&to_big, Endianness::Little, dump).unwrap();
        let twice = convert(&to_little, Endianness::Big, &once).unwrap();
        assert_eq!(twice, dump, "round trip failed for {}", unit_size);
    }
}

#[test]
fn test_single_bytes_unchanged_by_reversal() {
    let dump = SAMPLES[0].1;
    let fmt = FormatDescriptor {
        count: 4,
        unit_size: UnitSize::Byte,
        endianness: Endianness::Big,
    };
    assert_eq!(convert(&fmt, Endianness::Little, dump).unwrap(), dump);
}

#[test]
fn test_native_order_is_noop_for_every_sample() {
    for native in [Endianness::Little, Endianness::Big] {
        for &(unit_size, dump) in SAMPLES {
            let fmt = FormatDescriptor {
                count: 1,
                unit_size,
                endianness: native,
            };
            assert_eq!(convert(&fmt, native, dump).unwrap(), dump);
        }
    }
}

#[test]
fn test_handle_forwards_request() {
    let mut reader = ScriptedReader::new("0x1000 <buf>:\t0x1234\t0xabcd\n");
    let out = handle("/2hB  buf + 4 ", Endianness::Little, &mut reader).unwrap();

    assert_eq!(out, "0x1000 <buf>:\t0x3412\t0xcdab\n");
    assert_eq!(
        reader.requests,
        vec![ExamineRequest {
            count: 2,
            unit_size: UnitSize::Halfword,
            address_expr: "buf + 4".into(),
        }]
    );
}

#[test]
fn test_handle_defaults_pass_dump_through() {
    let dump = "0x1000:\t0x12345678\n";
    let mut reader = ScriptedReader::new(dump);
    let out = handle("0x1000", Endianness::Big, &mut reader).unwrap();

    assert_eq!(out, dump);
    assert_eq!(reader.requests[0].count, 1);
    assert_eq!(reader.requests[0].unit_size, UnitSize::Word);
}

#[test]
fn test_handle_bad_format_never_reads() {
    let mut reader = ScriptedReader::new("0x0:\t0x00000000\n");
    let result = handle("/bw 0x1000", Endianness::Little, &mut reader);

    assert!(matches!(result, Err(ExamineError::Format { .. })));
    assert!(reader.requests.is_empty());
}

#[test]
fn test_handle_missing_address() {
    let mut reader = ScriptedReader::new("");
    let result = handle("/4w", Endianness::Little, &mut reader);

    assert!(matches!(result, Err(ExamineError::AddressExpressionMissing)));
    assert!(reader.requests.is_empty());
}

#[test]
fn test_handle_read_failure() {
    let mut reader = ScriptedReader::failing("Cannot access memory");
    let err = handle("/wB 0xdead", Endianness::Little, &mut reader).unwrap_err();

    assert!(matches!(err, ExamineError::MemoryRead(_)));
    assert!(err.to_string().contains("Cannot access memory"));
}

#[test]
fn test_handle_malformed_dump() {
    let mut reader = ScriptedReader::new("0x1000:\t0x123\n");
    let result = handle("/wB 0x1000", Endianness::Little, &mut reader);
    assert!(matches!(result, Err(ExamineError::Conversion { .. })));
}
