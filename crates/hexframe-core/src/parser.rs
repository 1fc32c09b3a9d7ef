use std::ops::Range;

use tracing::{debug, info, warn};

use crate::checksum::validate_frame;
use crate::frame::{FrameScanner, data_segment, decode_fields};
use crate::input::{HexError, parse_hex_text};
use crate::protocol::ProtocolDefinition;
use crate::{Frame, ParseResult};

/// Parses hex text into frames according to one protocol definition.
///
/// A parser holds nothing but its definition, so it can be shared across
/// threads and reused for any number of inputs.
///
/// # Examples
/// ```
/// use hexframe_core::{Parser, default_protocol};
///
/// let parser = Parser::new(default_protocol());
/// let result = parser.parse("68 01 02 01 FF 03 16 68 02");
/// assert_eq!(result.total_frames(), 1);
/// assert_eq!(result.total_bytes(), 9);
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    protocol: ProtocolDefinition,
}

impl Parser {
    pub fn new(protocol: ProtocolDefinition) -> Self {
        Self { protocol }
    }

    pub fn protocol(&self) -> &ProtocolDefinition {
        &self.protocol
    }

    /// Convert free-form hex text into bytes, see [`parse_hex_text`].
    pub fn parse_hex_text(text: &str) -> Result<Vec<u8>, HexError> {
        parse_hex_text(text)
    }

    /// Frame spans in `buffer`, in order.
    pub fn find_frames(&self, buffer: &[u8]) -> Vec<Range<usize>> {
        self.scanner().find_frames(buffer)
    }

    /// Parse hex text. Malformed text yields a result holding a single
    /// frame #0 that describes the problem.
    pub fn parse(&self, text: &str) -> ParseResult {
        match parse_hex_text(text) {
            Ok(buffer) => self.parse_bytes(&buffer),
            Err(err) => {
                warn!(error = %err, "input is not valid hex");
                let mut result = ParseResult::new(0);
                result.push(Frame::input_error(format!("invalid hex input: {err}")));
                result
            }
        }
    }

    /// Parse an already decoded buffer.
    pub fn parse_bytes(&self, buffer: &[u8]) -> ParseResult {
        let mut result = ParseResult::new(buffer.len());
        for (index, span) in self.scanner().spans(buffer).enumerate() {
            let frame = self.parse_frame(index + 1, span.start, &buffer[span]);
            debug!(
                frame = frame.frame_number(),
                start = frame.start_position(),
                end = frame.end_position(),
                fields = frame.fields().len(),
                has_error = frame.has_error(),
                "decoded frame"
            );
            result.push(frame);
        }
        info!(
            protocol = self.protocol.name(),
            total_bytes = result.total_bytes(),
            frames = result.total_frames(),
            errors = result.error_frames(),
            "parse complete"
        );
        result
    }

    fn parse_frame(&self, frame_number: usize, start: usize, raw: &[u8]) -> Frame {
        let mut frame = Frame::new(frame_number, start, raw.to_vec());
        let checksum = self.protocol.checksum();
        let checksum_len = checksum
            .is_configured()
            .then_some(checksum.checksum_length);

        let segment = data_segment(
            raw.len(),
            self.protocol.frame_header().len(),
            self.protocol.frame_tail().len(),
            checksum_len,
        );
        let fields = match decode_fields(&raw[segment], self.protocol.fields()) {
            Ok(fields) => fields,
            Err(err) => {
                warn!(frame = frame_number, error = %err, "frame decode failed");
                frame.set_error(format!("frame decode failed: {err}"));
                return frame;
            }
        };
        frame.set_fields(fields);

        if checksum.is_configured() {
            frame.set_checksum_result(validate_frame(
                raw,
                checksum.algorithm,
                checksum.start_offset,
                checksum.end_offset,
                checksum.checksum_length,
            ));
        }
        frame
    }

    fn scanner(&self) -> FrameScanner<'_> {
        FrameScanner::new(self.protocol.frame_header(), self.protocol.frame_tail())
    }
}
