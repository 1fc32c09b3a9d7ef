use hexframe_core::{
    ChecksumAlgorithm, ChecksumConfig, FieldDefinition, FieldType, FieldValue, Parser,
    ProtocolDefinition, compute,
};

fn protocol(checksum: ChecksumConfig, fields: Vec<FieldDefinition>) -> ProtocolDefinition {
    fields
        .into_iter()
        .fold(
            ProtocolDefinition::builder()
                .frame_header("68")
                .frame_tail("16")
                .checksum(checksum),
            |builder, field| builder.field(field),
        )
        .build()
        .expect("valid protocol")
}

#[test]
fn crc_check_values() {
    assert_eq!(compute(b"123456789", ChecksumAlgorithm::Crc16), 0x4B37);
    assert_eq!(compute(b"123456789", ChecksumAlgorithm::Crc32), 0xCBF4_3926);
}

#[test]
fn sum_and_xor_check_values() {
    assert_eq!(compute(&[1, 2, 3, 4], ChecksumAlgorithm::Sum), 0x0A);
    assert_eq!(compute(&[1, 2, 3, 4], ChecksumAlgorithm::Xor), 0x04);
}

#[test]
fn valid_hex_without_markers_has_no_frames() {
    let parser = Parser::new(protocol(
        ChecksumConfig::default(),
        vec![FieldDefinition::new("cmd", 1, FieldType::UInt8)],
    ));
    let result = parser.parse("01 02 03 04 05");
    assert!(result.frames().is_empty());
    assert_eq!(result.total_bytes(), 5);
}

#[test]
fn frame_without_checksum_is_valid_with_no_values() {
    let parser = Parser::new(protocol(
        ChecksumConfig::default(),
        vec![FieldDefinition::new("cmd", 1, FieldType::UInt8)],
    ));
    let result = parser.parse("68 05 16");
    let frame = &result.frames()[0];
    assert!(frame.checksum_valid());
    assert_eq!(frame.expected_checksum(), None);
    assert_eq!(frame.actual_checksum(), None);
}

#[test]
fn parsing_is_idempotent() {
    let parser = Parser::new(hexframe_core::default_protocol());
    let input = "68 01 02 02 AA BB 6A 16 FF 68 02 01 00 03 16";
    assert_eq!(parser.parse(input), parser.parse(input));

    // quiet NaN stored as little-endian f32
    let parser = Parser::new(protocol(
        ChecksumConfig::default(),
        vec![FieldDefinition::new("t", 4, FieldType::Float32)],
    ));
    let first = parser.parse("68 00 00 C0 7F 16");
    assert!(matches!(
        first.frames()[0].field("t"),
        Some(FieldValue::Float(value)) if value.is_nan()
    ));
    assert_eq!(first, parser.parse("68 00 00 C0 7F 16"));
}

#[test]
fn variable_length_field_follows_length() {
    let parser = Parser::new(protocol(
        ChecksumConfig::default(),
        vec![
            FieldDefinition::new("len", 1, FieldType::UInt8),
            FieldDefinition::variable("data", FieldType::Bytes).with_length_field("len"),
        ],
    ));
    let result = parser.parse("68 03 AA BB CC 16");
    let frame = &result.frames()[0];
    assert_eq!(frame.field("data"), Some(&FieldValue::Bytes(vec![0xAA, 0xBB, 0xCC])));
}

#[test]
fn over_wide_schema_is_truncated_without_error() {
    let parser = Parser::new(protocol(
        ChecksumConfig::default(),
        vec![
            FieldDefinition::new("a", 1, FieldType::UInt8),
            FieldDefinition::new("b", 4, FieldType::UInt32),
            FieldDefinition::new("c", 1, FieldType::UInt8),
        ],
    ));
    let result = parser.parse("68 01 02 16");
    let frame = &result.frames()[0];
    assert_eq!(frame.fields().len(), 2);
    assert_eq!(frame.field("b"), Some(&FieldValue::Unsigned(0)));
    assert_eq!(frame.field("c"), None);
    assert!(!frame.has_error());
}

#[test]
fn malformed_hex_yields_single_error_frame() {
    let parser = Parser::new(hexframe_core::default_protocol());
    let result = parser.parse("68 1G 16");
    assert_eq!(result.total_frames(), 1);
    assert_eq!(result.frames()[0].frame_number(), 0);
    assert!(result.frames()[0].has_error());
}

#[test]
fn end_to_end_sum_before_checksum() {
    let parser = Parser::new(protocol(
        ChecksumConfig::new(ChecksumAlgorithm::Sum, -1, -2),
        vec![FieldDefinition::new("cmd", 1, FieldType::UInt8)],
    ));
    let result = parser.parse("68 05 0A 16");
    assert_eq!(result.total_frames(), 1);
    let frame = &result.frames()[0];
    assert_eq!(frame.field("cmd"), Some(&FieldValue::Unsigned(5)));
    // 0x68 + 0x05 = 0x6D, the frame carries 0x0A
    assert!(!frame.checksum_valid());
    assert_eq!(frame.expected_checksum(), Some(0x6D));
    assert_eq!(frame.actual_checksum(), Some(0x0A));

    let result = parser.parse("68 05 6D 16");
    assert!(result.frames()[0].checksum_valid());
    assert!(!result.frames()[0].has_error());
}
