use std::fmt;

use thiserror::Error;

use crate::input::HexError;

/// Which frame marker a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Header,
    Tail,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Header => write!(f, "frame header"),
            Marker::Tail => write!(f, "frame tail"),
        }
    }
}

/// Errors raised while building, validating or loading a protocol
/// definition. A definition that fails here never reaches the parser.
///
/// # Examples
/// ```
/// use hexframe_core::{FieldDefinition, FieldType, ProtocolDefinition, ProtocolError};
///
/// let err = ProtocolDefinition::builder()
///     .frame_header("68")
///     .frame_tail("16")
///     .field(FieldDefinition::new("a", 1, FieldType::UInt8))
///     .field(FieldDefinition::new("a", 1, FieldType::UInt8))
///     .build()
///     .unwrap_err();
/// assert!(matches!(err, ProtocolError::DuplicateField { .. }));
/// ```
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("{marker} must not be empty")]
    EmptyMarker { marker: Marker },
    #[error("{marker} is not valid hex: {source}")]
    InvalidMarker {
        marker: Marker,
        #[source]
        source: HexError,
    },
    #[error("at least one field must be defined")]
    NoFields,
    #[error("field names must be unique: '{name}' is defined more than once")]
    DuplicateField { name: String },
    #[error("length field '{length_field}' of field '{field}' does not exist")]
    UnknownLengthField { field: String, length_field: String },
    #[error("length field '{length_field}' of field '{field}' must be defined before it")]
    LengthFieldNotEarlier { field: String, length_field: String },
    #[error("checksum length {length} is not supported (at most 8 bytes)")]
    ChecksumTooLong { length: usize },
    #[error("unrecognized protocol definition format")]
    UnknownFormat,
    #[error("invalid protocol JSON: {0}")]
    Json(#[from] serde_json::Error),
}
