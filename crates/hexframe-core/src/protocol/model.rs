use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::{Marker, ProtocolError};
use crate::input::parse_hex_text;

/// Largest checksum width the engine can hold (`u64`).
pub const MAX_CHECKSUM_LENGTH: usize = 8;

/// Checksum algorithm applied to a frame.
///
/// Serialized with the tags used by persisted protocol files; English
/// aliases are accepted on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChecksumAlgorithm {
    #[default]
    #[serde(rename = "无校验", alias = "none", alias = "NONE")]
    None,
    #[serde(rename = "累加和", alias = "sum", alias = "SUM")]
    Sum,
    #[serde(rename = "异或校验", alias = "xor", alias = "XOR")]
    Xor,
    #[serde(rename = "CRC16", alias = "crc16")]
    Crc16,
    #[serde(rename = "CRC32", alias = "crc32")]
    Crc32,
}

impl ChecksumAlgorithm {
    /// Bit mask applied to a computed value before comparison.
    pub fn mask(self) -> u64 {
        match self {
            ChecksumAlgorithm::None | ChecksumAlgorithm::Sum | ChecksumAlgorithm::Xor => 0xFF,
            ChecksumAlgorithm::Crc16 => 0xFFFF,
            ChecksumAlgorithm::Crc32 => 0xFFFF_FFFF,
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChecksumAlgorithm::None => "none",
            ChecksumAlgorithm::Sum => "sum",
            ChecksumAlgorithm::Xor => "xor",
            ChecksumAlgorithm::Crc16 => "crc16",
            ChecksumAlgorithm::Crc32 => "crc32",
        };
        write!(f, "{label}")
    }
}

/// Where the checksum sits in the frame. Informational only: the engine
/// always computes the location itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChecksumPosition {
    #[default]
    #[serde(rename = "帧尾前", alias = "before_tail")]
    BeforeTail,
    #[serde(rename = "帧尾后", alias = "after_tail")]
    AfterTail,
    #[serde(rename = "自定义位置", alias = "custom")]
    Custom,
}

/// Checksum configuration of a protocol.
///
/// Offsets follow the persisted conventions: `start_offset == -1` includes
/// the header byte, `start_offset >= 0` skips one header byte plus that many
/// bytes; `end_offset == -1` stops before the tail byte, `-2` stops at the
/// checksum field, other negatives count from the frame end and
/// non-negatives are absolute indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksumConfig {
    #[serde(rename = "checksum_type")]
    pub algorithm: ChecksumAlgorithm,
    pub position: ChecksumPosition,
    pub start_offset: i64,
    pub end_offset: i64,
    #[serde(deserialize_with = "deserialize_checksum_length")]
    pub checksum_length: usize,
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self {
            algorithm: ChecksumAlgorithm::None,
            position: ChecksumPosition::BeforeTail,
            start_offset: 0,
            end_offset: -1,
            checksum_length: 1,
        }
    }
}

impl ChecksumConfig {
    /// Checksum over `[start_offset, end_offset)` with a one-byte checksum
    /// placed before the tail.
    pub fn new(algorithm: ChecksumAlgorithm, start_offset: i64, end_offset: i64) -> Self {
        Self {
            algorithm,
            start_offset,
            end_offset,
            ..Self::default()
        }
    }

    pub fn with_length(mut self, checksum_length: usize) -> Self {
        self.checksum_length = checksum_length.max(1);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.algorithm != ChecksumAlgorithm::None
    }
}

fn deserialize_checksum_length<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(usize::try_from(raw.max(1)).unwrap_or(usize::MAX))
}

/// Declared value type of a field. The set is closed; decoding dispatches
/// on it with an exhaustive match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "uint8")]
    UInt8,
    #[serde(rename = "uint16")]
    UInt16,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "int8")]
    Int8,
    #[serde(rename = "int16")]
    Int16,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "float", alias = "float32")]
    Float32,
    #[serde(rename = "double", alias = "float64")]
    Float64,
    #[default]
    #[serde(rename = "bytes")]
    Bytes,
    #[serde(rename = "string")]
    String,
}

impl FieldType {
    /// Persisted tag of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::UInt8 => "uint8",
            FieldType::UInt16 => "uint16",
            FieldType::UInt32 => "uint32",
            FieldType::Int8 => "int8",
            FieldType::Int16 => "int16",
            FieldType::Int32 => "int32",
            FieldType::Float32 => "float",
            FieldType::Float64 => "double",
            FieldType::Bytes => "bytes",
            FieldType::String => "string",
        }
    }

    /// Parse a persisted tag; `None` for anything outside the closed set.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let field_type = match tag {
            "uint8" => FieldType::UInt8,
            "uint16" => FieldType::UInt16,
            "uint32" => FieldType::UInt32,
            "int8" => FieldType::Int8,
            "int16" => FieldType::Int16,
            "int32" => FieldType::Int32,
            "float" | "float32" => FieldType::Float32,
            "double" | "float64" => FieldType::Float64,
            "bytes" => FieldType::Bytes,
            "string" => FieldType::String,
            _ => return None,
        };
        Some(field_type)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of the ordered field schema.
///
/// # Examples
/// ```
/// use hexframe_core::{FieldDefinition, FieldType};
///
/// let data = FieldDefinition::variable("data", FieldType::Bytes).with_length_field("len");
/// assert_eq!(data.byte_count, 0);
/// assert_eq!(data.length_field.as_deref(), Some("len"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    /// Number of bytes; 0 marks a variable-length field.
    pub byte_count: usize,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order: usize,
    /// Earlier field whose decoded value gives this field's length.
    #[serde(default)]
    pub length_field: Option<String>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, byte_count: usize, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            byte_count,
            field_type,
            description: String::new(),
            order: 0,
            length_field: None,
        }
    }

    pub fn variable(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, 0, field_type)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_length_field(mut self, length_field: impl Into<String>) -> Self {
        self.length_field = Some(length_field.into());
        self
    }

    pub fn is_variable(&self) -> bool {
        self.byte_count == 0
    }
}

/// Validated, immutable protocol description.
///
/// Construct it with [`ProtocolDefinition::builder`] or by loading JSON;
/// both paths run the same structural validation, so a value of this type
/// always satisfies the field-order invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProtocolDocument", into = "ProtocolDocument")]
pub struct ProtocolDefinition {
    name: String,
    version: String,
    description: String,
    frame_header: Vec<u8>,
    frame_tail: Vec<u8>,
    checksum: ChecksumConfig,
    fields: Vec<FieldDefinition>,
}

impl ProtocolDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn frame_header(&self) -> &[u8] {
        &self.frame_header
    }

    pub fn frame_tail(&self) -> &[u8] {
        &self.frame_tail
    }

    pub fn checksum(&self) -> &ChecksumConfig {
        &self.checksum
    }

    /// Fields in decode order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Built-in example definition: `68 … 16` frames with an address, a command,
/// a length byte and a variable data block sized by that length, protected
/// by an 8-bit sum.
///
/// # Examples
/// ```
/// use hexframe_core::default_protocol;
///
/// let protocol = default_protocol();
/// assert_eq!(protocol.fields().len(), 4);
/// assert_eq!(protocol.fields()[3].length_field.as_deref(), Some("长度"));
/// ```
pub fn default_protocol() -> ProtocolDefinition {
    ProtocolDefinition {
        name: "默认协议".to_string(),
        version: "1.0".to_string(),
        description: "这是一个默认的协议配置示例".to_string(),
        frame_header: vec![0x68],
        frame_tail: vec![0x16],
        checksum: ChecksumConfig::new(ChecksumAlgorithm::Sum, 0, -1),
        fields: vec![
            FieldDefinition::new("地址", 1, FieldType::UInt8).with_description("设备地址"),
            FieldDefinition {
                order: 1,
                ..FieldDefinition::new("命令", 1, FieldType::UInt8).with_description("命令码")
            },
            FieldDefinition {
                order: 2,
                ..FieldDefinition::new("长度", 1, FieldType::UInt8).with_description("数据长度")
            },
            FieldDefinition {
                order: 3,
                ..FieldDefinition::variable("数据", FieldType::Bytes)
                    .with_description("数据内容")
                    .with_length_field("长度")
            },
        ],
    }
}

/// Persisted shape of a protocol definition (standard schema).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolDocument {
    #[serde(default = "default_protocol_name")]
    pub protocol_name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub frame_header: String,
    pub frame_tail: String,
    #[serde(default)]
    pub checksum_config: ChecksumConfig,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

pub(super) fn default_protocol_name() -> String {
    "默认协议".to_string()
}

pub(super) fn default_version() -> String {
    "1.0".to_string()
}

impl TryFrom<ProtocolDocument> for ProtocolDefinition {
    type Error = ProtocolError;

    fn try_from(doc: ProtocolDocument) -> Result<Self, Self::Error> {
        let frame_header = decode_marker(&doc.frame_header, Marker::Header)?;
        let frame_tail = decode_marker(&doc.frame_tail, Marker::Tail)?;

        let checksum = doc.checksum_config;
        if checksum.is_configured() && checksum.checksum_length > MAX_CHECKSUM_LENGTH {
            return Err(ProtocolError::ChecksumTooLong {
                length: checksum.checksum_length,
            });
        }

        let fields: Vec<FieldDefinition> = doc
            .fields
            .into_iter()
            .map(|mut field| {
                if field.length_field.as_deref().is_some_and(str::is_empty) {
                    field.length_field = None;
                }
                field
            })
            .collect();
        validate_fields(&fields)?;

        Ok(Self {
            name: doc.protocol_name,
            version: doc.version,
            description: doc.description,
            frame_header,
            frame_tail,
            checksum,
            fields,
        })
    }
}

impl From<ProtocolDefinition> for ProtocolDocument {
    fn from(value: ProtocolDefinition) -> Self {
        Self {
            protocol_name: value.name,
            version: value.version,
            description: value.description,
            frame_header: hex::encode_upper(&value.frame_header),
            frame_tail: hex::encode_upper(&value.frame_tail),
            checksum_config: value.checksum,
            fields: value.fields,
        }
    }
}

fn decode_marker(text: &str, marker: Marker) -> Result<Vec<u8>, ProtocolError> {
    if text.trim().is_empty() {
        return Err(ProtocolError::EmptyMarker { marker });
    }
    let bytes =
        parse_hex_text(text).map_err(|source| ProtocolError::InvalidMarker { marker, source })?;
    if bytes.is_empty() {
        return Err(ProtocolError::EmptyMarker { marker });
    }
    Ok(bytes)
}

fn validate_fields(fields: &[FieldDefinition]) -> Result<(), ProtocolError> {
    if fields.is_empty() {
        return Err(ProtocolError::NoFields);
    }

    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(ProtocolError::DuplicateField {
                name: field.name.clone(),
            });
        }
    }

    for (index, field) in fields.iter().enumerate() {
        let Some(length_field) = field.length_field.as_deref() else {
            continue;
        };
        match fields.iter().position(|other| other.name == length_field) {
            None => {
                return Err(ProtocolError::UnknownLengthField {
                    field: field.name.clone(),
                    length_field: length_field.to_string(),
                });
            }
            Some(position) if position >= index => {
                return Err(ProtocolError::LengthFieldNotEarlier {
                    field: field.name.clone(),
                    length_field: length_field.to_string(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(fields: Vec<FieldDefinition>) -> ProtocolDocument {
        ProtocolDocument {
            protocol_name: "test".to_string(),
            version: "1.0".to_string(),
            description: String::new(),
            frame_header: "68".to_string(),
            frame_tail: "16".to_string(),
            checksum_config: ChecksumConfig::default(),
            fields,
        }
    }

    #[test]
    fn rejects_forward_length_reference() {
        let doc = document(vec![
            FieldDefinition::variable("data", FieldType::Bytes).with_length_field("len"),
            FieldDefinition::new("len", 1, FieldType::UInt8),
        ]);
        let err = ProtocolDefinition::try_from(doc).unwrap_err();
        assert!(matches!(err, ProtocolError::LengthFieldNotEarlier { .. }));
        assert!(err.to_string().contains("must be defined before"));
    }

    #[test]
    fn rejects_self_length_reference() {
        let doc = document(vec![
            FieldDefinition::variable("data", FieldType::Bytes).with_length_field("data"),
        ]);
        let err = ProtocolDefinition::try_from(doc).unwrap_err();
        assert!(matches!(err, ProtocolError::LengthFieldNotEarlier { .. }));
    }

    #[test]
    fn rejects_dangling_length_reference() {
        let doc = document(vec![
            FieldDefinition::variable("data", FieldType::Bytes).with_length_field("missing"),
        ]);
        let err = ProtocolDefinition::try_from(doc).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownLengthField { .. }));
    }

    #[test]
    fn empty_length_field_means_absent() {
        let doc = document(vec![
            FieldDefinition::variable("data", FieldType::Bytes).with_length_field(""),
        ]);
        let protocol = ProtocolDefinition::try_from(doc).unwrap();
        assert_eq!(protocol.fields()[0].length_field, None);
    }

    #[test]
    fn rejects_non_hex_marker() {
        let mut doc = document(vec![FieldDefinition::new("a", 1, FieldType::UInt8)]);
        doc.frame_tail = "ZZ".to_string();
        let err = ProtocolDefinition::try_from(doc).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidMarker {
                marker: Marker::Tail,
                ..
            }
        ));
        assert!(err.to_string().starts_with("frame tail is not valid hex"));
    }

    #[test]
    fn rejects_empty_marker() {
        let mut doc = document(vec![FieldDefinition::new("a", 1, FieldType::UInt8)]);
        doc.frame_header = " ".to_string();
        let err = ProtocolDefinition::try_from(doc).unwrap_err();
        assert_eq!(err.to_string(), "frame header must not be empty");
    }

    #[test]
    fn rejects_wide_checksum_only_when_configured() {
        let mut doc = document(vec![FieldDefinition::new("a", 1, FieldType::UInt8)]);
        doc.checksum_config.checksum_length = 9;
        assert!(ProtocolDefinition::try_from(doc.clone()).is_ok());

        doc.checksum_config.algorithm = ChecksumAlgorithm::Crc32;
        let err = ProtocolDefinition::try_from(doc).unwrap_err();
        assert!(matches!(err, ProtocolError::ChecksumTooLong { length: 9 }));
    }

    #[test]
    fn checksum_config_defaults_and_clamps_length() {
        let config: ChecksumConfig =
            serde_json::from_str(r#"{"checksum_type": "sum", "checksum_length": 0}"#).unwrap();
        assert_eq!(config.algorithm, ChecksumAlgorithm::Sum);
        assert_eq!(config.position, ChecksumPosition::BeforeTail);
        assert_eq!(config.start_offset, 0);
        assert_eq!(config.end_offset, -1);
        assert_eq!(config.checksum_length, 1);
    }

    #[test]
    fn field_type_tags_round_trip() {
        for tag in [
            "uint8", "uint16", "uint32", "int8", "int16", "int32", "float", "double", "bytes",
            "string",
        ] {
            let field_type = FieldType::from_tag(tag).unwrap();
            assert_eq!(field_type.as_str(), tag);
            let json = serde_json::to_value(field_type).unwrap();
            assert_eq!(json, serde_json::Value::String(tag.to_string()));
        }
        assert_eq!(FieldType::from_tag("fixed"), None);
    }

    #[test]
    fn algorithm_serializes_to_persisted_tag() {
        let value = serde_json::to_value(ChecksumAlgorithm::Sum).unwrap();
        assert_eq!(value, serde_json::json!("累加和"));
        let xor: ChecksumAlgorithm = serde_json::from_str(r#""XOR""#).unwrap();
        assert_eq!(xor, ChecksumAlgorithm::Xor);
    }
}
