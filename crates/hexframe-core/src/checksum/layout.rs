use std::ops::Range;

use crate::common::bounds::resolve_range;

/// Bytes assumed in front of the checksummed data when `start_offset >= 0`.
pub const HEADER_SKIP: i64 = 1;
/// Bytes assumed after the checksum field.
pub const TAIL_LEN: usize = 1;

/// `start_offset` value that includes the header byte.
pub const INCLUDE_HEADER: i64 = -1;
/// `end_offset` value that stops before the tail byte.
pub const UNTIL_TAIL: i64 = -1;
/// `end_offset` value that stops at the checksum field.
pub const UNTIL_CHECKSUM: i64 = -2;

/// Position of the checksum field inside a frame of `frame_len` bytes.
///
/// The caller guarantees `frame_len >= checksum_length + TAIL_LEN`.
pub fn checksum_range(frame_len: usize, checksum_length: usize) -> Range<usize> {
    let start = frame_len - TAIL_LEN - checksum_length;
    start..start + checksum_length
}

/// Bytes covered by the checksum, resolved against a frame of `frame_len`
/// bytes whose checksum field starts at `checksum_start`.
///
/// # Examples
/// ```
/// use hexframe_core::checksum::layout::covered_range;
///
/// // 68 05 0A 16: everything before the checksum, header included
/// assert_eq!(covered_range(4, 2, -1, -2), 0..2);
/// // header skipped, stop before the tail
/// assert_eq!(covered_range(4, 2, 0, -1), 1..3);
/// ```
pub fn covered_range(
    frame_len: usize,
    checksum_start: usize,
    start_offset: i64,
    end_offset: i64,
) -> Range<usize> {
    let len = i64::try_from(frame_len).unwrap_or(i64::MAX);
    let start = if start_offset == INCLUDE_HEADER {
        0
    } else {
        HEADER_SKIP.saturating_add(start_offset)
    };
    let end = match end_offset {
        UNTIL_TAIL => len - 1,
        UNTIL_CHECKSUM => i64::try_from(checksum_start).unwrap_or(i64::MAX),
        offset if offset < 0 => len.saturating_add(offset),
        offset => offset,
    };
    resolve_range(frame_len, start, end)
}
