//! The prediction archive seam.
//!
//! After every completed inference the pipeline emits one append event to
//! an [`Archiver`] collaborator. The storage engine behind it, and any
//! query or review surface over the records, belong to the embedding
//! application; this module defines the record shape, the trait, and two
//! reference implementations — an append-only JSON-lines file and an
//! in-memory collector for tests.
//!
//! An archiver's write failure never rolls back or fails the user-facing
//! response: the prediction was still delivered. The pipeline logs the
//! failure and reports the outcome as degraded.

pub mod store;

pub use store::ImageStore;

use crate::core::errors::{ScreenError, ScreenResult};
use crate::domain::label::ClassLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// One archived prediction. Created once per completed inference, never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Identity of the requesting user.
    pub user: String,
    /// When the prediction completed.
    pub recorded_at: DateTime<Utc>,
    /// Reference to the stored archival image copy, when one was written.
    pub stored_image: Option<String>,
    /// The sanitized filename the client declared.
    pub original_filename: String,
    /// The predicted class.
    pub label: ClassLabel,
    /// The probability of the predicted class.
    pub confidence: f32,
}

/// Collaborator interface for persisting prediction records.
pub trait Archiver: Send + Sync + std::fmt::Debug {
    /// Appends one record.
    ///
    /// Implementations must not block indefinitely and must surface
    /// failures as `ScreenError::Archive`; the pipeline treats any error
    /// as a degraded, non-fatal condition.
    fn record(&self, record: &PredictionRecord) -> ScreenResult<()>;
}

/// Append-only JSON-lines archiver.
///
/// Each record becomes one JSON object per line. Appends are serialized
/// through a lock so concurrent requests cannot interleave partial lines.
#[derive(Debug)]
pub struct JsonlArchiver {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlArchiver {
    /// Creates an archiver appending to the given file, creating parent
    /// directories and the file on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The file records are appended to.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Archiver for JsonlArchiver {
    fn record(&self, record: &PredictionRecord) -> ScreenResult<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| ScreenError::archive("failed to serialize record", e))?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ScreenError::archive("archive lock poisoned", PoisonedLock))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ScreenError::archive("failed to create archive directory", e))?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ScreenError::archive("failed to open archive file", e))?;
        writeln!(file, "{line}")
            .map_err(|e| ScreenError::archive("failed to append record", e))?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("a previous archive write panicked")]
struct PoisonedLock;

/// In-memory archiver for tests and embedding-application fakes.
#[derive(Debug, Default)]
pub struct MemoryArchiver {
    records: Mutex<Vec<PredictionRecord>>,
}

impl MemoryArchiver {
    /// Creates an empty archiver.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PredictionRecord>> {
        // A poisoned lock still holds valid records.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<PredictionRecord> {
        self.lock().clone()
    }

    /// Number of records archived so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing has been archived.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Archiver for MemoryArchiver {
    fn record(&self, record: &PredictionRecord) -> ScreenResult<()> {
        self.lock().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> PredictionRecord {
        PredictionRecord {
            user: "researcher1".to_string(),
            recorded_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
            stored_image: Some("uploads/Normal_20260314_092653_researcher1.jpg".to_string()),
            original_filename: "face.jpg".to_string(),
            label: ClassLabel::Normal,
            confidence: 0.97,
        }
    }

    #[test]
    fn memory_archiver_collects_records() {
        let archiver = MemoryArchiver::new();
        assert!(archiver.is_empty());
        archiver.record(&sample_record()).unwrap();
        archiver.record(&sample_record()).unwrap();
        assert_eq!(archiver.len(), 2);
        assert_eq!(archiver.records()[0].user, "researcher1");
    }

    #[test]
    fn jsonl_archiver_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive").join("predictions.jsonl");
        let archiver = JsonlArchiver::new(&path);

        archiver.record(&sample_record()).unwrap();
        archiver.record(&sample_record()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: PredictionRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, sample_record());
    }

    #[test]
    fn record_label_serializes_as_display_name() {
        let json = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(json["label"], "Normal");
        let indicator = PredictionRecord {
            label: ClassLabel::DownSyndrome,
            ..sample_record()
        };
        let json = serde_json::to_value(indicator).unwrap();
        assert_eq!(json["label"], "Down Syndrome");
    }
}
