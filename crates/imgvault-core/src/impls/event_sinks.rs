//! EventSink 実装
//!
//! - TracingEventSink: 本番用。tracing でログに出す
//! - RecordingEventSink: テスト用。受け取ったイベントを保持する
//! - NoopEventSink: 何もしない

use std::sync::Mutex;

use tracing::{info, warn};

use crate::domain::DomainEvent;
use crate::ports::EventSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &DomainEvent) {
        let name = event.name();
        match event {
            DomainEvent::RunStarted { run_id, root } => {
                info!(event = name, %run_id, root = %root.display(), "ingestion started");
            }
            DomainEvent::FileStored {
                run_id,
                name: image,
                path,
                original_size,
                stored_size,
                elapsed,
            } => {
                info!(
                    event = name,
                    %run_id,
                    image = %image,
                    path = %path.display(),
                    original_size,
                    stored_size,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "stored image"
                );
            }
            DomainEvent::FileAlreadyPresent {
                run_id,
                name: image,
                path,
            } => {
                info!(event = name, %run_id, image = %image, path = %path.display(), "already stored, skipped");
            }
            DomainEvent::FileFailed {
                run_id,
                path,
                kind,
                reason,
            } => {
                let path = path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                warn!(event = name, %run_id, path = %path, kind = ?kind, reason = %reason, "file failed");
            }
            DomainEvent::RunFinished {
                run_id,
                stored,
                already_present,
                failed,
                elapsed,
            } => {
                info!(
                    event = name,
                    %run_id,
                    stored,
                    already_present,
                    failed,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "ingestion finished"
                );
            }
            DomainEvent::PollAttempt { attempt, elapsed } => {
                info!(event = name, attempt, elapsed_s = elapsed.as_secs_f64(), "not ready yet");
            }
            DomainEvent::PollFetchFailed { attempt, reason } => {
                warn!(event = name, attempt, reason = %reason, "status fetch failed, will retry");
            }
            DomainEvent::PollReady { attempts, elapsed } => {
                info!(event = name, attempts, elapsed_s = elapsed.as_secs_f64(), "ready");
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &DomainEvent) {}
}

#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Event names in emission order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(DomainEvent::name).collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: &DomainEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
