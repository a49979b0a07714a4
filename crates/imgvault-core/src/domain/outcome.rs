//! Outcome model: per-file results and the run report.
//!
//! The pipeline yields `Result<FileOutcome, FileError>` per file; the report
//! is the aggregated, serializable view of a whole run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::errors::{ErrorKind, FileError};
use super::ids::RunId;

/// What happened to a file that was processed without error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    /// A new record was written.
    Stored {
        name: String,
        path: PathBuf,
        original_size: u64,
        stored_size: u64,
    },

    /// A record with this name already exists; nothing was written.
    AlreadyPresent { name: String, path: PathBuf },
}

impl FileOutcome {
    pub fn name(&self) -> &str {
        match self {
            FileOutcome::Stored { name, .. } | FileOutcome::AlreadyPresent { name, .. } => name,
        }
    }
}

/// A recorded per-file failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub kind: ErrorKind,
    pub reason: String,
}

impl From<&FileError> for FileFailure {
    fn from(err: &FileError) -> Self {
        Self {
            path: err.path().map(PathBuf::from),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub run_id: RunId,

    /// Names written during this run.
    pub stored: Vec<String>,

    /// Names skipped because they were already in the store.
    pub already_present: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FileFailure>,
}

impl IngestReport {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            stored: Vec::new(),
            already_present: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Fold one file result into the report.
    pub fn record(&mut self, result: &Result<FileOutcome, FileError>) {
        match result {
            Ok(FileOutcome::Stored { name, .. }) => self.stored.push(name.clone()),
            Ok(FileOutcome::AlreadyPresent { name, .. }) => {
                self.already_present.push(name.clone())
            }
            Err(err) => self.failures.push(FileFailure::from(err)),
        }
    }

    /// Number of files the run visited.
    pub fn visited(&self) -> usize {
        self.stored.len() + self.already_present.len() + self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::CodecError;
    use ulid::Ulid;

    #[test]
    fn report_counts_each_result_once() {
        let mut report = IngestReport::new(RunId::from_ulid(Ulid::new()));
        report.record(&Ok(FileOutcome::Stored {
            name: "a.png".into(),
            path: "/in/a.png".into(),
            original_size: 10,
            stored_size: 8,
        }));
        report.record(&Ok(FileOutcome::AlreadyPresent {
            name: "b.png".into(),
            path: "/in/b.png".into(),
        }));
        report.record(&Err(FileError::Codec {
            path: "/in/c.jpg".into(),
            source: CodecError::UnsupportedInput("not an image".into()),
        }));

        assert_eq!(report.stored, vec!["a.png".to_string()]);
        assert_eq!(report.already_present, vec!["b.png".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, Some(PathBuf::from("/in/c.jpg")));
        assert_eq!(report.failures[0].kind, ErrorKind::Permanent);
        assert_eq!(report.visited(), 3);
    }

    #[test]
    fn file_outcome_is_tagged() {
        let o = FileOutcome::AlreadyPresent {
            name: "a.png".into(),
            path: "/in/a.png".into(),
        };
        let v = serde_json::to_value(&o).unwrap();
        assert_eq!(v["outcome"], "already_present");
        assert_eq!(v["name"], "a.png");
    }
}
