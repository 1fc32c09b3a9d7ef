use std::ops::Range;

/// Resolve a signed index against a sequence of `len` items.
///
/// Negative indices count back from the end once; the result is clamped to
/// `0..=len`. Protocol offsets are persisted as signed integers, so every
/// computed frame sub-range goes through this before slicing.
pub(crate) fn resolve_index(len: usize, index: i64) -> usize {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if index < 0 {
        len.saturating_add(index)
    } else {
        index
    };
    // clamp keeps the value inside 0..=len, which came from a usize
    resolved.clamp(0, len) as usize
}

/// Resolve a signed `[start, end)` pair into a range that is always safe to
/// slice with. A start at or past the end yields an empty range.
pub(crate) fn resolve_range(len: usize, start: i64, end: i64) -> Range<usize> {
    let start = resolve_index(len, start);
    let end = resolve_index(len, end);
    if start >= end { start..start } else { start..end }
}
