use thiserror::Error;

/// Reasons a checksum could not be evaluated. These never leave the engine:
/// `validate_frame` reports them as a failed check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChecksumError {
    #[error("frame too short for checksum: need {needed} bytes, got {actual}")]
    FrameTooShort { needed: usize, actual: usize },
    #[error("checksum length {length} exceeds {max} bytes")]
    UnsupportedLength { length: usize, max: usize },
}
