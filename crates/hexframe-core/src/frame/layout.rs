use std::ops::Range;

use crate::common::bounds::resolve_range;

/// Data segment of a frame: after the header, before the checksum (when one
/// is configured) and the tail.
///
/// Bounds are resolved like signed slice indices, so a trailer longer than
/// the frame counts back from the end instead of failing.
pub fn data_segment(
    frame_len: usize,
    header_len: usize,
    tail_len: usize,
    checksum_len: Option<usize>,
) -> Range<usize> {
    let trailer = tail_len.saturating_add(checksum_len.unwrap_or(0));
    let start = i64::try_from(header_len).unwrap_or(i64::MAX);
    let end = i64::try_from(frame_len)
        .unwrap_or(i64::MAX)
        .saturating_sub(i64::try_from(trailer).unwrap_or(i64::MAX));
    resolve_range(frame_len, start, end)
}
