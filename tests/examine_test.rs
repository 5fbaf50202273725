//! Integration tests for the `box` command
//!
//! Run with: cargo test --test examine_test

use boxamine::analysis::loader::{LoadedBinary, SymbolInfo};
use boxamine::app::{parse_command, AppCommand, EndianSetting, Session};
use boxamine::core::dump::DumpReader;
use boxamine::core::memory::{MemoryError, MemoryManager};
use boxamine::examine::{handle, Endianness, ExamineError};

/// 16 bytes at 0x1000: an ELF magic followed by a little-endian counter
fn image() -> LoadedBinary {
    let data = vec![
        0x7f, 0x45, 0x4c, 0x46, 0x02, 0x01, 0x01, 0x00, //
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
    ];
    let mut image = LoadedBinary::raw(data, "snapshot".into(), 0x1000);
    image.symbols = vec![SymbolInfo {
        name: "counter".into(),
        address: 0x1008,
        size: 8,
    }];
    image
}

#[test]
fn test_box_big_endian_words() {
    let image = image();
    let mut reader = DumpReader::new(&image, Endianness::Little);

    let out = handle("/4wB 0x1000", Endianness::Little, &mut reader).unwrap();
    assert_eq!(
        out,
        "0x1000:\t0x7f454c46\t0x02010100\t0x01020304\t0x05060708\n"
    );
}

#[test]
fn test_box_native_matches_x() {
    let image = image();
    let mut reader = DumpReader::new(&image, Endianness::Little);

    let out = handle("/2w 0x1000", Endianness::Little, &mut reader).unwrap();
    assert_eq!(out, "0x1000:\t0x464c457f\t0x00010102\n");
}

#[test]
fn test_box_symbol_labels() {
    let image = image();
    let mut reader = DumpReader::new(&image, Endianness::Little);

    let out = handle("/2hB counter + 2", Endianness::Little, &mut reader).unwrap();
    assert_eq!(out, "0x100a <counter+2>:\t0x0304\t0x0506\n");
}

#[test]
fn test_box_giant_round_trip() {
    let image = image();
    let mut reader = DumpReader::new(&image, Endianness::Big);

    let big = handle("/gB counter", Endianness::Big, &mut reader).unwrap();
    let little = handle("/gL counter", Endianness::Big, &mut reader).unwrap();
    assert_eq!(big, "0x1008 <counter>:\t0x0102030405060708\n");
    assert_eq!(little, "0x1008 <counter>:\t0x0807060504030201\n");
}

#[test]
fn test_box_errors() {
    let image = image();
    let mut reader = DumpReader::new(&image, Endianness::Little);

    assert!(matches!(
        handle("/lb 0x1000", Endianness::Little, &mut reader),
        Err(ExamineError::Format { .. })
    ));
    assert!(matches!(
        handle("/4wB", Endianness::Little, &mut reader),
        Err(ExamineError::AddressExpressionMissing)
    ));
    assert!(matches!(
        handle("/8gB 0x1000", Endianness::Little, &mut reader),
        Err(ExamineError::MemoryRead(_))
    ));
    assert!(matches!(
        handle("/wB nowhere", Endianness::Little, &mut reader),
        Err(ExamineError::MemoryRead(_))
    ));
}

#[test]
fn test_session_resolves_endianness_per_command() {
    let mut session = Session::new();
    session.binary = Some(image());

    // A flat image has no byte order of its own
    let AppCommand::Box(args) = parse_command("box/2wB 0x1000") else {
        panic!("box did not parse");
    };
    assert!(matches!(
        session.examine_converted(&args),
        Err(ExamineError::EndiannessUnknown)
    ));

    session.endian = EndianSetting::Little;
    assert_eq!(
        session.examine_converted(&args).unwrap(),
        "0x1000:\t0x7f454c46\t0x02010100\n"
    );

    // Switching the setting changes the very next invocation
    session.endian = EndianSetting::Big;
    assert_eq!(
        session.examine_converted(&args).unwrap(),
        "0x1000:\t0x7f454c46\t0x02010100\n"
    );
    assert_eq!(
        session.examine_raw("/2w 0x1000").unwrap(),
        "0x1000:\t0x7f454c46\t0x02010100\n"
    );
    assert_eq!(
        session.examine_converted("/2wL 0x1000").unwrap(),
        "0x1000:\t0x464c457f\t0x00010102\n"
    );
}

#[test]
fn test_box_huge_count_on_live_process() {
    let mut mm = MemoryManager::new();
    let _ = mm.open_process(std::process::id());
    let mut reader = DumpReader::new(&mm, Endianness::Little);

    let err = handle("/4294967295gB 0x1000", Endianness::Little, &mut reader).unwrap_err();
    assert!(matches!(
        err,
        ExamineError::MemoryRead(MemoryError::ReadFailed { .. })
    ));
}
