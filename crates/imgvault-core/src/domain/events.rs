//! Events - ドメインイベント
//!
//! 進捗報告は println ではなく EventSink にイベントとして流します。
//! 制御フロー（パイプライン・ポーリング）と報告を分離するためです。

use std::path::PathBuf;
use std::time::Duration;

use super::errors::ErrorKind;
use super::ids::RunId;

/// DomainEvent はパイプラインとポーラーで発生したイベント
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    RunStarted {
        run_id: RunId,
        root: PathBuf,
    },
    FileStored {
        run_id: RunId,
        name: String,
        path: PathBuf,
        original_size: u64,
        stored_size: u64,
        elapsed: Duration,
    },
    FileAlreadyPresent {
        run_id: RunId,
        name: String,
        path: PathBuf,
    },
    FileFailed {
        run_id: RunId,
        path: Option<PathBuf>,
        kind: ErrorKind,
        reason: String,
    },
    RunFinished {
        run_id: RunId,
        stored: usize,
        already_present: usize,
        failed: usize,
        elapsed: Duration,
    },

    /// One fetch returned a state that did not satisfy the predicate.
    PollAttempt {
        attempt: u32,
        elapsed: Duration,
    },
    /// One fetch failed; polling continues.
    PollFetchFailed {
        attempt: u32,
        reason: String,
    },
    PollReady {
        attempts: u32,
        elapsed: Duration,
    },
}

impl DomainEvent {
    /// Short machine-friendly name, used as the `event` field in logs.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::RunStarted { .. } => "run_started",
            DomainEvent::FileStored { .. } => "file_stored",
            DomainEvent::FileAlreadyPresent { .. } => "file_already_present",
            DomainEvent::FileFailed { .. } => "file_failed",
            DomainEvent::RunFinished { .. } => "run_finished",
            DomainEvent::PollAttempt { .. } => "poll_attempt",
            DomainEvent::PollFetchFailed { .. } => "poll_fetch_failed",
            DomainEvent::PollReady { .. } => "poll_ready",
        }
    }
}
