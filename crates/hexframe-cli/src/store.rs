use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use hexframe_core::{HistoryError, RecordStore};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// History records persisted as a pretty-printed JSON array.
///
/// A missing file reads as an empty history; parent directories are created
/// on first save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Serialize + DeserializeOwned> RecordStore<T> for JsonFileStore {
    fn load(&self) -> Result<Vec<T>, HistoryError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&mut self, records: &[T]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut json = serde_json::to_string_pretty(records)?;
        json.push('\n');
        fs::write(&self.path, json)?;
        Ok(())
    }
}
