//! Poller - 外部リソースが条件を満たすまでポーリングする
//!
//! # 状態
//! - WAITING: fetch して predicate が偽、または fetch が失敗
//! - READY: predicate が真（終端）
//!
//! # 設計原則
//! - fetch の失敗は一時的なものとして扱い、間隔を空けて再試行する
//! - 既定は無制限（max_attempts / deadline は明示的に指定したときだけ効く）
//! - キャンセルは watch チャネルで受け取る（true を送る、または sender を drop）

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::domain::{DomainEvent, PollError};
use crate::impls::NoopEventSink;
use crate::ports::{EventSink, StatusSource};

/// Interval and optional bounds for a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    /// No attempt starts at or after this much time since the first fetch.
    pub deadline: Option<Duration>,
}

impl PollPolicy {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            deadline: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::every(Duration::from_secs(10))
    }
}

/// The state that satisfied the predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome<T> {
    pub state: T,
    pub attempts: u32,
    pub elapsed: Duration,
}

pub struct Poller {
    policy: PollPolicy,
    events: Arc<dyn EventSink>,
    cancel: Option<watch::Receiver<bool>>,
}

impl Poller {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            events: Arc::new(NoopEventSink),
            cancel: None,
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Fetch until `predicate` holds, sleeping `interval` between attempts.
    ///
    /// Blocks the caller until READY. Returns an error only when a bound from
    /// the policy is hit or cancellation is signalled.
    pub async fn until<S, P>(
        &self,
        source: &S,
        predicate: P,
    ) -> Result<PollOutcome<S::State>, PollError>
    where
        S: StatusSource + ?Sized,
        P: Fn(&S::State) -> bool,
    {
        let started = Instant::now();
        let mut cancel = self.cancel.clone();
        let mut attempts: u32 = 0;

        loop {
            if let Some(rx) = cancel.as_ref()
                && *rx.borrow()
            {
                return Err(PollError::Cancelled { attempts });
            }

            attempts += 1;
            match source.fetch().await {
                Ok(state) if predicate(&state) => {
                    let elapsed = started.elapsed();
                    self.events.emit(&DomainEvent::PollReady { attempts, elapsed });
                    return Ok(PollOutcome {
                        state,
                        attempts,
                        elapsed,
                    });
                }
                Ok(_) => self.events.emit(&DomainEvent::PollAttempt {
                    attempt: attempts,
                    elapsed: started.elapsed(),
                }),
                Err(err) => self.events.emit(&DomainEvent::PollFetchFailed {
                    attempt: attempts,
                    reason: err.to_string(),
                }),
            }

            if let Some(max) = self.policy.max_attempts
                && attempts >= max
            {
                return Err(PollError::AttemptsExhausted { attempts });
            }
            if let Some(deadline) = self.policy.deadline
                && started.elapsed() + self.policy.interval >= deadline
            {
                return Err(PollError::DeadlineExceeded { deadline, attempts });
            }

            if !sleep_or_cancel(self.policy.interval, cancel.as_mut()).await {
                return Err(PollError::Cancelled { attempts });
            }
        }
    }
}

/// Sleep for `delay`. Returns false if cancellation arrived first.
async fn sleep_or_cancel(delay: Duration, cancel: Option<&mut watch::Receiver<bool>>) -> bool {
    let Some(rx) = cancel else {
        tokio::time::sleep(delay).await;
        return true;
    };

    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = rx.changed() => {
                // sender の drop もキャンセル扱い
                if changed.is_err() || *rx.borrow_and_update() {
                    return false;
                }
            }
        }
    }
}
