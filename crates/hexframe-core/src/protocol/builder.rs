use super::error::ProtocolError;
use super::model::{
    ChecksumConfig, FieldDefinition, ProtocolDefinition, ProtocolDocument, default_protocol_name,
    default_version,
};

/// Step-by-step construction of a [`ProtocolDefinition`].
///
/// Fields are appended in decode order and numbered as they are added.
/// `build` runs the same validation as JSON loading.
///
/// # Examples
/// ```
/// use hexframe_core::{
///     ChecksumAlgorithm, ChecksumConfig, FieldDefinition, FieldType, ProtocolDefinition,
/// };
///
/// let protocol = ProtocolDefinition::builder()
///     .name("meter")
///     .frame_header("68")
///     .frame_tail("16")
///     .checksum(ChecksumConfig::new(ChecksumAlgorithm::Sum, -1, -2))
///     .field(FieldDefinition::new("cmd", 1, FieldType::UInt8))
///     .build()?;
/// assert_eq!(protocol.frame_header(), &[0x68]);
/// assert_eq!(protocol.fields()[0].order, 0);
/// # Ok::<(), hexframe_core::ProtocolError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ProtocolBuilder {
    doc: ProtocolDocument,
}

impl Default for ProtocolBuilder {
    fn default() -> Self {
        Self {
            doc: ProtocolDocument {
                protocol_name: default_protocol_name(),
                version: default_version(),
                description: String::new(),
                frame_header: String::new(),
                frame_tail: String::new(),
                checksum_config: ChecksumConfig::default(),
                fields: Vec::new(),
            },
        }
    }
}

impl ProtocolBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.doc.protocol_name = name.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.doc.version = version.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.doc.description = description.into();
        self
    }

    /// Header marker as hex text, e.g. `"68"` or `"AA 55"`.
    pub fn frame_header(mut self, hex: impl Into<String>) -> Self {
        self.doc.frame_header = hex.into();
        self
    }

    /// Tail marker as hex text.
    pub fn frame_tail(mut self, hex: impl Into<String>) -> Self {
        self.doc.frame_tail = hex.into();
        self
    }

    pub fn checksum(mut self, checksum: ChecksumConfig) -> Self {
        self.doc.checksum_config = checksum;
        self
    }

    pub fn field(mut self, mut field: FieldDefinition) -> Self {
        field.order = self.doc.fields.len();
        self.doc.fields.push(field);
        self
    }

    pub fn build(self) -> Result<ProtocolDefinition, ProtocolError> {
        ProtocolDefinition::try_from(self.doc)
    }
}

impl ProtocolDefinition {
    pub fn builder() -> ProtocolBuilder {
        ProtocolBuilder::default()
    }
}
