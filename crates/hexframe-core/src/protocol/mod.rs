//! Protocol definitions.
//!
//! A definition names the frame markers, the checksum configuration and the
//! ordered field schema. It is validated once, when built or loaded, and is
//! immutable afterwards; the parser relies on the invariants checked here
//! (unique names, non-empty hex markers, length references that point to an
//! earlier field) instead of re-checking them per frame.
//!
//! JSON documents use the persisted schema (`protocol_name`,
//! `checksum_config.checksum_type = "累加和"`, ...). Documents written in the
//! extended schema are detected and mapped onto it in `extended` before
//! validation.

pub mod builder;
pub mod error;
pub mod extended;
mod model;

pub use builder::ProtocolBuilder;
pub use error::{Marker, ProtocolError};
pub use extended::{SchemaFormat, convert_extended, detect_format, to_standard};
pub use model::{
    ChecksumAlgorithm, ChecksumConfig, ChecksumPosition, FieldDefinition, FieldType,
    MAX_CHECKSUM_LENGTH, ProtocolDefinition, default_protocol,
};

use model::ProtocolDocument;
use serde_json::Value;

impl ProtocolDefinition {
    /// Load a definition from JSON text in either schema.
    ///
    /// # Examples
    /// ```
    /// use hexframe_core::{ChecksumAlgorithm, ProtocolDefinition};
    ///
    /// let json = r#"{
    ///     "protocol_name": "meter",
    ///     "frame_header": "68",
    ///     "frame_tail": "16",
    ///     "checksum_config": {"checksum_type": "累加和", "start_offset": -1, "end_offset": -2},
    ///     "fields": [{"name": "cmd", "byte_count": 1, "field_type": "uint8"}]
    /// }"#;
    /// let protocol = ProtocolDefinition::from_json_str(json)?;
    /// assert_eq!(protocol.checksum().algorithm, ChecksumAlgorithm::Sum);
    /// # Ok::<(), hexframe_core::ProtocolError>(())
    /// ```
    ///
    /// # Errors
    /// Returns `ProtocolError` for malformed JSON, an unrecognized schema or
    /// a definition that fails structural validation.
    pub fn from_json_str(text: &str) -> Result<Self, ProtocolError> {
        let doc: Value = serde_json::from_str(text)?;
        Self::from_json_value(doc)
    }

    /// Load a definition from an already parsed JSON document.
    pub fn from_json_value(doc: Value) -> Result<Self, ProtocolError> {
        let standard = to_standard(doc)?;
        let doc: ProtocolDocument = serde_json::from_value(standard)?;
        Self::try_from(doc)
    }

    /// Standard-schema JSON, pretty-printed.
    pub fn to_json_pretty(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
