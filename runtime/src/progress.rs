// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress event types and broadcast channel for run telemetry.
//!
//! The pipeline and orchestrator emit `RunEvent`s as each stage and candidate
//! resolves. Events flow through a `tokio::sync::broadcast` channel to all
//! subscribers (the CLI's JSON printer, tests). When no subscriber exists,
//! events are silently dropped.

use crate::model::EngagementOutcome;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A progress event emitted during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    /// The run this event belongs to.
    pub run_id: String,
    /// Monotonically increasing sequence number.
    pub seq: u64,
    /// The kind of progress event.
    pub event: RunEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunEventKind {
    /// The session gateway accepted the session.
    Authenticated { strategy: String },
    /// The session gateway rejected the session; the run aborts.
    AuthenticationFailed { strategy: String, reason: String },
    /// The solicitation post was submitted.
    PostPublished { title: String },
    /// Publishing failed; the run continues.
    PublishFailed { reason: String },
    /// The forum listing was scanned.
    ScanCompleted { entries: usize, candidates: usize },
    /// Engagement with one candidate has started.
    CandidateStarted { profile_url: String },
    /// Engagement with one candidate reached a terminal state.
    CandidateResolved { outcome: EngagementOutcome },
    /// The run finished and the browser was released.
    RunComplete {
        candidates: usize,
        subscribed: usize,
        commented: usize,
        elapsed_ms: u64,
    },
    /// A non-fatal warning occurred.
    Warning { message: String },
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<RunEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<RunEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
///
/// A run emits a handful of stage events plus two per candidate; a forum
/// page lists a few dozen posts at most.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Stamps events with the run id and sequence number and sends them.
#[derive(Debug)]
pub struct Progress {
    tx: Option<ProgressSender>,
    run_id: String,
    seq: AtomicU64,
}

impl Progress {
    pub fn new(tx: Option<ProgressSender>, run_id: impl Into<String>) -> Self {
        Self {
            tx,
            run_id: run_id.into(),
            seq: AtomicU64::new(0),
        }
    }

    /// A reporter with no listeners.
    pub fn silent() -> Self {
        Self::new(None, "silent")
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Emit an event, silently ignoring send errors (which occur when no
    /// receivers are listening).
    pub fn emit(&self, event: RunEventKind) {
        if let Some(ref sender) = self.tx {
            let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
            let _ = sender.send(RunEvent {
                run_id: self.run_id.clone(),
                seq,
                event,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Candidate, EngagementState};

    #[test]
    fn test_run_event_serialization() {
        let event = RunEvent {
            run_id: "run-1".to_string(),
            seq: 1,
            event: RunEventKind::ScanCompleted {
                entries: 20,
                candidates: 3,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("ScanCompleted"));
        assert!(json.contains("\"candidates\":3"));

        let parsed: RunEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.run_id, "run-1");
        assert_eq!(parsed.seq, 1);
    }

    #[test]
    fn test_outcome_event_carries_state() {
        let outcome = EngagementOutcome::new(
            Candidate::new("https://a.tistory.com/"),
            EngagementState::AlreadySubscribed,
        );
        let json = serde_json::to_string(&RunEventKind::CandidateResolved { outcome }).unwrap();
        assert!(json.contains("already_subscribed"));
        assert!(json.contains("\"commented\":false"));
    }

    #[tokio::test]
    async fn test_sequence_numbers_increase() {
        let (tx, mut rx) = channel();
        let progress = Progress::new(Some(tx), "run-7");
        progress.emit(RunEventKind::Warning {
            message: "a".to_string(),
        });
        progress.emit(RunEventKind::Warning {
            message: "b".to_string(),
        });
        assert_eq!(rx.recv().await.unwrap().seq, 1);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.seq, 2);
        assert_eq!(second.run_id, "run-7");
    }

    #[test]
    fn test_no_receivers_is_fine() {
        let (tx, rx) = channel();
        drop(rx);
        let progress = Progress::new(Some(tx), "run");
        progress.emit(RunEventKind::Warning {
            message: "nobody listening".to_string(),
        });
        Progress::silent().emit(RunEventKind::Warning {
            message: "no sender".to_string(),
        });
    }
}
