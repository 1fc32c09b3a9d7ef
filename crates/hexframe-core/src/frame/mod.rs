//! Frame scanning and field decoding.
//!
//! `scanner` finds `header … tail` spans, `layout` cuts the data segment out
//! of a span, and `decoder` walks the field schema over that segment using
//! bounds-checked reads from `reader`.

pub mod decoder;
pub mod error;
pub mod layout;
mod reader;
pub mod scanner;

pub use decoder::{decode_fields, decode_value};
pub use error::FrameError;
pub use layout::data_segment;
pub use scanner::{FrameScanner, Spans};
