use std::ops::Range;

use tracing::debug;

/// Locates `header … tail` spans in a buffer.
///
/// Spans never overlap: scanning resumes right after the previous tail. A
/// header without a following tail ends the scan and the trailing fragment
/// is dropped.
///
/// # Examples
/// ```
/// use hexframe_core::FrameScanner;
///
/// let scanner = FrameScanner::new(&[0x68], &[0x16]);
/// let spans = scanner.find_frames(&[0x00, 0x68, 0x01, 0x16, 0x68, 0x02]);
/// assert_eq!(spans, vec![1..4]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FrameScanner<'p> {
    header: &'p [u8],
    tail: &'p [u8],
}

impl<'p> FrameScanner<'p> {
    pub fn new(header: &'p [u8], tail: &'p [u8]) -> Self {
        Self { header, tail }
    }

    /// All spans, in buffer order. `end` is exclusive and includes the tail.
    pub fn find_frames(&self, buffer: &[u8]) -> Vec<Range<usize>> {
        self.spans(buffer).collect()
    }

    /// Lazy form of [`FrameScanner::find_frames`].
    pub fn spans<'b>(&self, buffer: &'b [u8]) -> Spans<'p, 'b> {
        Spans {
            scanner: *self,
            buffer,
            cursor: 0,
        }
    }
}

/// Iterator over frame spans, see [`FrameScanner::spans`].
#[derive(Debug, Clone)]
pub struct Spans<'p, 'b> {
    scanner: FrameScanner<'p>,
    buffer: &'b [u8],
    cursor: usize,
}

impl Iterator for Spans<'_, '_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let FrameScanner { header, tail } = self.scanner;
        if header.is_empty() || tail.is_empty() || self.cursor >= self.buffer.len() {
            return None;
        }

        let start = self.cursor + find(&self.buffer[self.cursor..], header)?;
        let search_from = start + header.len();
        let Some(tail_at) = self
            .buffer
            .get(search_from..)
            .and_then(|rest| find(rest, tail))
        else {
            debug!(start, "header without tail, dropping trailing bytes");
            self.cursor = self.buffer.len();
            return None;
        };

        let end = search_from + tail_at + tail.len();
        debug!(start, end, "frame span");
        self.cursor = end;
        Some(start..end)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
