//! Analysis history.
//!
//! Each parse can be summarized into an [`AnalysisRecord`]. Records are kept
//! newest first, capped at a maximum count, and persisted through a
//! [`RecordStore`] so the library itself never touches the filesystem.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

use crate::ParseResult;

/// Records kept when no explicit limit is given.
pub const DEFAULT_MAX_HISTORY: usize = 20;
/// Characters of input text kept in a record before it is cut.
pub const INPUT_PREVIEW_CHARS: usize = 200;
/// Frames summarized per record.
pub const FRAME_DIGEST_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid history JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timestamp formatting failed: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Storage backend for history records.
pub trait RecordStore<T> {
    fn load(&self) -> Result<Vec<T>, HistoryError>;
    fn save(&mut self, records: &[T]) -> Result<(), HistoryError>;
}

/// In-memory store, mostly useful in tests.
#[derive(Debug, Clone)]
pub struct MemoryStore<T> {
    records: Vec<T>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T: Clone> MemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<T>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }
}

impl<T: Clone> RecordStore<T> for MemoryStore<T> {
    fn load(&self) -> Result<Vec<T>, HistoryError> {
        Ok(self.records.clone())
    }

    fn save(&mut self, records: &[T]) -> Result<(), HistoryError> {
        self.records = records.to_vec();
        Ok(())
    }
}

/// Short per-frame summary stored in a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDigest {
    pub frame_number: usize,
    pub has_error: bool,
    pub checksum_valid: bool,
    pub raw_data_hex: String,
}

/// Summary of one parse.
///
/// # Examples
/// ```
/// use hexframe_core::{AnalysisRecord, Parser, default_protocol};
/// use time::OffsetDateTime;
///
/// let result = Parser::new(default_protocol()).parse("68 01 02 00 03 16");
/// let record =
///     AnalysisRecord::from_result("默认协议", "68 01 02 00 03 16", &result, OffsetDateTime::UNIX_EPOCH)?;
/// assert_eq!(record.timestamp, "1970-01-01T00:00:00Z");
/// assert_eq!(record.total_frames, 1);
/// # Ok::<(), hexframe_core::HistoryError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// RFC 3339 time of the analysis.
    pub timestamp: String,
    pub protocol_name: String,
    /// Input text, cut to its first 200 characters plus `"..."`.
    pub input_data: String,
    pub total_frames: usize,
    pub valid_frames: usize,
    pub error_frames: usize,
    /// At most the first ten frames.
    pub frame_summary: Vec<FrameDigest>,
}

impl AnalysisRecord {
    pub fn from_result(
        protocol_name: &str,
        input: &str,
        result: &ParseResult,
        at: OffsetDateTime,
    ) -> Result<Self, HistoryError> {
        Ok(Self {
            timestamp: at.format(&Rfc3339)?,
            protocol_name: protocol_name.to_string(),
            input_data: preview(input),
            total_frames: result.total_frames(),
            valid_frames: result.valid_frames(),
            error_frames: result.error_frames(),
            frame_summary: result
                .frames()
                .iter()
                .take(FRAME_DIGEST_LIMIT)
                .map(|frame| FrameDigest {
                    frame_number: frame.frame_number(),
                    has_error: frame.has_error(),
                    checksum_valid: frame.checksum_valid(),
                    raw_data_hex: frame.raw_data_hex(),
                })
                .collect(),
        })
    }
}

fn preview(input: &str) -> String {
    match input.char_indices().nth(INPUT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &input[..cut]),
        None => input.to_string(),
    }
}

/// Newest-first list of analysis records backed by a [`RecordStore`].
pub struct AnalysisHistory<S> {
    store: S,
    records: Vec<AnalysisRecord>,
    max_history: usize,
}

impl<S: RecordStore<AnalysisRecord>> AnalysisHistory<S> {
    /// Open with [`DEFAULT_MAX_HISTORY`]. A store that cannot be read starts
    /// an empty history.
    pub fn open(store: S) -> Self {
        Self::with_limit(store, DEFAULT_MAX_HISTORY)
    }

    pub fn with_limit(store: S, max_history: usize) -> Self {
        let records = match store.load() {
            Ok(mut records) => {
                records.truncate(max_history);
                records
            }
            Err(err) => {
                warn!(error = %err, "could not load analysis history, starting empty");
                Vec::new()
            }
        };
        Self {
            store,
            records,
            max_history,
        }
    }

    /// Insert `record` as the newest entry, drop the oldest beyond the limit
    /// and persist.
    pub fn add(&mut self, record: AnalysisRecord) -> Result<(), HistoryError> {
        self.records.insert(0, record);
        self.records.truncate(self.max_history);
        self.store.save(&self.records)
    }

    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    /// Zero-based, newest first.
    pub fn record(&self, index: usize) -> Option<&AnalysisRecord> {
        self.records.get(index)
    }

    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.records.clear();
        self.store.save(&self.records)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Parser, default_protocol};

    fn record(name: &str) -> AnalysisRecord {
        let result = Parser::new(default_protocol()).parse("68 01 02 00 03 16");
        AnalysisRecord::from_result(name, "68 01 02 00 03 16", &result, OffsetDateTime::UNIX_EPOCH)
            .unwrap()
    }

    struct BrokenStore;

    impl RecordStore<AnalysisRecord> for BrokenStore {
        fn load(&self) -> Result<Vec<AnalysisRecord>, HistoryError> {
            Err(HistoryError::Io(std::io::Error::other("unreadable")))
        }

        fn save(&mut self, _records: &[AnalysisRecord]) -> Result<(), HistoryError> {
            Err(HistoryError::Io(std::io::Error::other("read-only")))
        }
    }

    #[test]
    fn newest_first_and_capped() {
        let mut history = AnalysisHistory::with_limit(MemoryStore::new(), 2);
        history.add(record("a")).unwrap();
        history.add(record("b")).unwrap();
        history.add(record("c")).unwrap();
        let names: Vec<_> = history
            .records()
            .iter()
            .map(|r| r.protocol_name.as_str())
            .collect();
        assert_eq!(names, vec!["c", "b"]);
        assert_eq!(history.store().records().len(), 2);
        assert_eq!(history.record(0).map(|r| r.protocol_name.as_str()), Some("c"));
        assert!(history.record(2).is_none());
    }

    #[test]
    fn loads_existing_records() {
        let store = MemoryStore::with_records(vec![record("old")]);
        let history = AnalysisHistory::open(store);
        assert_eq!(history.records().len(), 1);
    }

    #[test]
    fn unreadable_store_starts_empty() {
        let mut history = AnalysisHistory::open(BrokenStore);
        assert!(history.records().is_empty());
        assert!(history.add(record("x")).is_err());
    }

    #[test]
    fn clear_persists_empty_list() {
        let mut history = AnalysisHistory::open(MemoryStore::with_records(vec![record("a")]));
        history.clear().unwrap();
        assert!(history.records().is_empty());
        assert!(history.store().records().is_empty());
    }

    #[test]
    fn long_input_is_cut() {
        let input = "A".repeat(250);
        let text = preview(&input);
        assert_eq!(text.len(), 203);
        assert!(text.ends_with("..."));
        assert_eq!(preview("68 16"), "68 16");
        assert_eq!(preview(&"B".repeat(200)), "B".repeat(200));
    }

    #[test]
    fn digest_keeps_ten_frames() {
        let input = "68 16 ".repeat(12);
        let result = Parser::new(default_protocol()).parse(&input);
        let record =
            AnalysisRecord::from_result("p", &input, &result, OffsetDateTime::UNIX_EPOCH).unwrap();
        assert_eq!(record.total_frames, 12);
        assert_eq!(record.frame_summary.len(), 10);
        assert_eq!(record.frame_summary[0].raw_data_hex, "68 16");
    }

    #[test]
    fn record_round_trips_through_json() {
        let original = record("json");
        let text = serde_json::to_string(&original).unwrap();
        let back: AnalysisRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, original);
    }
}
