use thiserror::Error;

/// Failures while splitting or decoding one frame. They never abort a parse:
/// the parser records them on the affected frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("field data too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("length field '{length_field}' of field '{field}' holds {value}, not a byte count")]
    InvalidLength {
        field: String,
        length_field: String,
        value: String,
    },
}
