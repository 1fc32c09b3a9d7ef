//! hexframe core library: configuration-driven binary frame parsing.
//!
//! A [`ProtocolDefinition`] describes frame markers, an ordered field schema
//! and a checksum. The [`Parser`] turns free-form hex text into bytes, finds
//! `header … tail` spans (`frame::scanner`), decodes the fields of each span
//! (`frame::decoder`) and validates its checksum (`checksum`). The result is
//! a [`ParseResult`]: plain data, serializable, immutable once returned.
//!
//! Invariants:
//! - Only malformed hex text discards a parse; every other failure is
//!   recorded on the frame it affects.
//! - Identical input produces an identical result.
//! - The library performs no I/O. History persistence goes through the
//!   [`RecordStore`] trait.
//!
//! # Examples
//! ```
//! use hexframe_core::{
//!     ChecksumAlgorithm, ChecksumConfig, FieldDefinition, FieldType, FieldValue, Parser,
//!     ProtocolDefinition,
//! };
//!
//! let protocol = ProtocolDefinition::builder()
//!     .frame_header("68")
//!     .frame_tail("16")
//!     .checksum(ChecksumConfig::new(ChecksumAlgorithm::Sum, -1, -2))
//!     .field(FieldDefinition::new("cmd", 1, FieldType::UInt8))
//!     .build()?;
//! let result = Parser::new(protocol).parse("68 05 6D 16");
//! assert_eq!(result.total_frames(), 1);
//! assert_eq!(result.frames()[0].field("cmd"), Some(&FieldValue::Unsigned(5)));
//! assert!(result.frames()[0].checksum_valid());
//! # Ok::<(), hexframe_core::ProtocolError>(())
//! ```

use std::fmt;

use serde::Serialize;

pub mod checksum;
mod common;
pub mod frame;
pub mod history;
mod input;
mod parser;
pub mod protocol;

pub use checksum::{ChecksumCheck, ChecksumError, compute, validate_frame};
pub use frame::{FrameError, FrameScanner, decode_fields, decode_value};
pub use history::{
    AnalysisHistory, AnalysisRecord, DEFAULT_MAX_HISTORY, FrameDigest, HistoryError,
    MemoryStore, RecordStore,
};
pub use input::{HexError, format_hex, parse_hex_text};
pub use parser::Parser;
pub use protocol::{
    ChecksumAlgorithm, ChecksumConfig, ChecksumPosition, FieldDefinition, FieldType, Marker,
    ProtocolBuilder, ProtocolError, ProtocolDefinition, SchemaFormat, default_protocol,
    detect_format,
};

use input::serialize_hex;

/// Decoded value of one field.
///
/// Serialized untagged: numbers as JSON numbers, text as a string and raw
/// bytes as a space-separated hex string.
///
/// # Examples
/// ```
/// use hexframe_core::FieldValue;
///
/// assert_eq!(FieldValue::Bytes(vec![0xAA, 0x0B]).to_string(), "AA 0B");
/// assert_eq!(FieldValue::Signed(-3).to_string(), "-3");
/// assert_eq!(FieldValue::Unsigned(3).as_length(), Some(3));
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
    #[serde(serialize_with = "serialize_hex")]
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// The value as a byte count, if it is a non-negative integer.
    pub fn as_length(&self) -> Option<usize> {
        match self {
            FieldValue::Unsigned(value) => usize::try_from(*value).ok(),
            FieldValue::Signed(value) => usize::try_from(*value).ok(),
            FieldValue::Float(_) | FieldValue::Text(_) | FieldValue::Bytes(_) => None,
        }
    }
}

/// Floats compare by bit pattern, so a decoded NaN equals itself and
/// identical input always yields equal results.
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Unsigned(a), FieldValue::Unsigned(b)) => a == b,
            (FieldValue::Signed(a), FieldValue::Signed(b)) => a == b,
            (FieldValue::Float(a), FieldValue::Float(b)) => a.to_bits() == b.to_bits(),
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Bytes(a), FieldValue::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unsigned(value) => write!(f, "{value}"),
            FieldValue::Signed(value) => write!(f, "{value}"),
            FieldValue::Float(value) => write!(f, "{value:?}"),
            FieldValue::Text(value) => write!(f, "{value}"),
            FieldValue::Bytes(value) => write!(f, "{}", format_hex(value)),
        }
    }
}

/// One decoded field, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedField {
    name: String,
    field_type: FieldType,
    value: FieldValue,
}

impl DecodedField {
    pub(crate) fn new(name: &str, field_type: FieldType, value: FieldValue) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type of the field.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}

/// Checksum outcome of a frame, as shown in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumStatus {
    Pass,
    Fail,
    /// No checksum was evaluated for the frame.
    NotConfigured,
}

impl fmt::Display for ChecksumStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChecksumStatus::Pass => "Pass",
            ChecksumStatus::Fail => "Fail",
            ChecksumStatus::NotConfigured => "No checksum configured",
        };
        write!(f, "{label}")
    }
}

/// One delimited frame and everything decoded from it.
///
/// `frame_number` starts at 1; number 0 is reserved for the single
/// synthetic frame reporting malformed input text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    frame_number: usize,
    start_position: usize,
    end_position: usize,
    #[serde(serialize_with = "serialize_hex")]
    raw_data: Vec<u8>,
    fields: Vec<DecodedField>,
    checksum_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_checksum: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_checksum: Option<u64>,
    has_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl Frame {
    pub(crate) fn new(frame_number: usize, start_position: usize, raw_data: Vec<u8>) -> Self {
        Self {
            frame_number,
            start_position,
            end_position: start_position + raw_data.len(),
            raw_data,
            fields: Vec::new(),
            checksum_valid: true,
            expected_checksum: None,
            actual_checksum: None,
            has_error: false,
            error_message: None,
        }
    }

    /// Frame #0 carrying an input-level error.
    pub(crate) fn input_error(message: String) -> Self {
        let mut frame = Self::new(0, 0, Vec::new());
        frame.set_error(message);
        frame
    }

    pub(crate) fn set_fields(&mut self, fields: Vec<DecodedField>) {
        self.fields = fields;
    }

    pub(crate) fn set_checksum_result(&mut self, check: ChecksumCheck) {
        self.checksum_valid = check.valid;
        self.expected_checksum = Some(check.expected);
        self.actual_checksum = Some(check.actual);
        if !check.valid {
            self.set_error(format!(
                "checksum mismatch: expected 0x{:02X}, actual 0x{:02X}",
                check.expected, check.actual
            ));
        }
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.has_error = true;
        self.error_message = Some(message);
    }

    pub fn frame_number(&self) -> usize {
        self.frame_number
    }

    /// Offset of the header in the input buffer.
    pub fn start_position(&self) -> usize {
        self.start_position
    }

    /// Offset just past the tail in the input buffer.
    pub fn end_position(&self) -> usize {
        self.end_position
    }

    pub fn raw_data(&self) -> &[u8] {
        &self.raw_data
    }

    /// Decoded fields in schema order. Fields that did not fit in the data
    /// segment are absent.
    pub fn fields(&self) -> &[DecodedField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(DecodedField::value)
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(DecodedField::field_type)
    }

    pub fn checksum_valid(&self) -> bool {
        self.checksum_valid
    }

    pub fn expected_checksum(&self) -> Option<u64> {
        self.expected_checksum
    }

    pub fn actual_checksum(&self) -> Option<u64> {
        self.actual_checksum
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Raw bytes as space-separated uppercase hex pairs.
    pub fn raw_data_hex(&self) -> String {
        format_hex(&self.raw_data)
    }

    /// `name=value` pairs joined by `", "`, or `"not decoded"` when the frame
    /// has no fields.
    ///
    /// # Examples
    /// ```
    /// use hexframe_core::{Parser, default_protocol};
    ///
    /// let result = Parser::new(default_protocol()).parse("68 01 02 02 AA BB 6A 16");
    /// assert_eq!(
    ///     result.frames()[0].field_summary(),
    ///     "地址=1, 命令=2, 长度=2, 数据=AA BB"
    /// );
    /// ```
    pub fn field_summary(&self) -> String {
        if self.fields.is_empty() {
            return "not decoded".to_string();
        }
        self.fields
            .iter()
            .map(|field| format!("{}={}", field.name, field.value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn checksum_status(&self) -> ChecksumStatus {
        match (self.expected_checksum, self.actual_checksum) {
            (Some(_), Some(_)) if self.checksum_valid => ChecksumStatus::Pass,
            (Some(_), Some(_)) => ChecksumStatus::Fail,
            _ => ChecksumStatus::NotConfigured,
        }
    }
}

/// Frames found in one input, in buffer order, plus the input size.
///
/// # Examples
/// ```
/// use hexframe_core::{Parser, default_protocol};
///
/// let result = Parser::new(default_protocol()).parse("00 11 22");
/// assert_eq!(result.total_frames(), 0);
/// assert_eq!(result.total_bytes(), 3);
/// assert_eq!(result.summary(), "frames: 0, valid: 0, errors: 0");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseResult {
    frames: Vec<Frame>,
    total_bytes: usize,
}

impl ParseResult {
    pub(crate) fn new(total_bytes: usize) -> Self {
        Self {
            frames: Vec::new(),
            total_bytes,
        }
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Zero-based access into [`ParseResult::frames`].
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Number of bytes in the decoded input (0 when the hex text was
    /// malformed).
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn valid_frames(&self) -> usize {
        self.frames.iter().filter(|frame| !frame.has_error).count()
    }

    pub fn error_frames(&self) -> usize {
        self.frames.iter().filter(|frame| frame.has_error).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "frames: {}, valid: {}, errors: {}",
            self.total_frames(),
            self.valid_frames(),
            self.error_frames()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(valid: bool, expected: u64, actual: u64) -> ChecksumCheck {
        ChecksumCheck {
            valid,
            expected,
            actual,
        }
    }

    #[test]
    fn checksum_mismatch_marks_frame() {
        let mut frame = Frame::new(1, 4, vec![0x68, 0x05, 0x0A, 0x16]);
        frame.set_checksum_result(check(false, 0x6D, 0x0A));
        assert!(frame.has_error());
        assert_eq!(
            frame.error_message(),
            Some("checksum mismatch: expected 0x6D, actual 0x0A")
        );
        assert_eq!(frame.checksum_status(), ChecksumStatus::Fail);
        assert_eq!(frame.end_position(), 8);
    }

    #[test]
    fn status_without_checksum() {
        let frame = Frame::new(1, 0, vec![0x68, 0x16]);
        assert!(frame.checksum_valid());
        assert_eq!(frame.checksum_status(), ChecksumStatus::NotConfigured);
        assert_eq!(frame.checksum_status().to_string(), "No checksum configured");
        assert_eq!(frame.field_summary(), "not decoded");
    }

    #[test]
    fn passing_checksum_keeps_frame_clean() {
        let mut frame = Frame::new(1, 0, vec![0x68, 0x00, 0x16]);
        frame.set_checksum_result(check(true, 0, 0));
        assert!(!frame.has_error());
        assert_eq!(frame.checksum_status(), ChecksumStatus::Pass);
    }

    #[test]
    fn frame_serializes_hex_and_skips_absent_values() {
        let mut frame = Frame::new(1, 0, vec![0x68, 0x01, 0x16]);
        frame.set_fields(vec![DecodedField::new(
            "a",
            FieldType::UInt8,
            FieldValue::Unsigned(1),
        )]);
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["raw_data"], "68 01 16");
        assert_eq!(json["fields"][0]["field_type"], "uint8");
        assert_eq!(json["fields"][0]["value"], 1);
        assert!(json.get("expected_checksum").is_none());
        assert!(json.get("error_message").is_none());
    }

    #[test]
    fn field_values_serialize_untagged() {
        let values = vec![
            FieldValue::Unsigned(7),
            FieldValue::Signed(-7),
            FieldValue::Float(1.5),
            FieldValue::Text("ok".to_string()),
            FieldValue::Bytes(vec![0xDE, 0xAD]),
        ];
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json, serde_json::json!([7, -7, 1.5, "ok", "DE AD"]));
    }

    #[test]
    fn float_values_compare_by_bits() {
        assert_eq!(FieldValue::Float(f64::NAN), FieldValue::Float(f64::NAN));
        assert_ne!(FieldValue::Float(0.0), FieldValue::Float(-0.0));
        assert_ne!(FieldValue::Float(1.0), FieldValue::Unsigned(1));
    }

    #[test]
    fn lengths_come_from_non_negative_integers_only() {
        assert_eq!(FieldValue::Signed(4).as_length(), Some(4));
        assert_eq!(FieldValue::Signed(-1).as_length(), None);
        assert_eq!(FieldValue::Float(4.0).as_length(), None);
        assert_eq!(FieldValue::Bytes(vec![4]).as_length(), None);
    }

    #[test]
    fn result_counts_frames() {
        let mut result = ParseResult::new(10);
        result.push(Frame::new(1, 0, vec![0x68, 0x16]));
        let mut bad = Frame::new(2, 2, vec![0x68, 0x16]);
        bad.set_error("broken".to_string());
        result.push(bad);
        assert_eq!(result.total_frames(), 2);
        assert_eq!(result.valid_frames(), 1);
        assert_eq!(result.error_frames(), 1);
        assert_eq!(result.frame(1).map(Frame::frame_number), Some(2));
        assert!(result.frame(2).is_none());
        assert_eq!(result.summary(), "frames: 2, valid: 1, errors: 1");
    }
}
