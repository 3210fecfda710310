//! # Sync Orchestrator
//!
//! One sync cycle, end to end, and the rule for when the checkpoint moves.
//!
//! ## Cycle State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──► no entities? ──yes──► Skipped (warn, no calls)               │
//! │              │ no                                                       │
//! │              ▼                                                          │
//! │          Fetching ── 0 records ──► Empty (checkpoint unchanged)         │
//! │              │ ≥1                                                       │
//! │              ▼                                                          │
//! │          Transforming ──► payload sink (failure = warn only)            │
//! │              │                                                          │
//! │              ▼                                                          │
//! │          Publishing ── 0 accepted ──► Stalled (checkpoint unchanged)    │
//! │              │ ≥1                                                       │
//! │              ▼                                                          │
//! │          Advanced (checkpoint := now)                                   │
//! │                                                                         │
//! │   Every branch returns a CycleReport and leaves the orchestrator Idle. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The orchestrator holds no state of its own. Callers pass the
//! [`SyncState`] in and serialize concurrent cycles themselves.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use gistpipe_core::{transform, Checkpoint, Clock, Gist, SyncState};

use crate::destination::ActivityApi;
use crate::error::SyncResult;
use crate::fetcher::SourceFetcher;
use crate::publisher::DestinationPublisher;
use crate::sink::PayloadSink;
use crate::source::GistSource;

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Phases a cycle passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Fetching,
    Transforming,
    Publishing,
}

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// No tracked entities.
    Skipped,
    /// Nothing fetched.
    Empty,
    /// At least one activity created; checkpoint moved.
    Advanced,
    /// Records fetched but none accepted.
    Stalled,
}

impl CycleOutcome {
    pub fn advanced(&self) -> bool {
        matches!(self, CycleOutcome::Advanced)
    }
}

/// Summary of one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub fetched: usize,
    pub transformed: usize,
    pub published: usize,
    /// Checkpoint after the cycle.
    pub checkpoint: Checkpoint,
    pub started_at: DateTime<Utc>,
}

impl CycleReport {
    fn new(outcome: CycleOutcome, checkpoint: Checkpoint, started_at: DateTime<Utc>) -> Self {
        CycleReport {
            outcome,
            fetched: 0,
            transformed: 0,
            published: 0,
            checkpoint,
            started_at,
        }
    }
}

pub struct SyncOrchestrator {
    fetcher: SourceFetcher,
    publisher: DestinationPublisher,
    sink: Arc<dyn PayloadSink>,
    clock: Arc<dyn Clock>,
}

impl SyncOrchestrator {
    pub fn new(
        source: Arc<dyn GistSource>,
        api: Arc<dyn ActivityApi>,
        sink: Arc<dyn PayloadSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        SyncOrchestrator {
            fetcher: SourceFetcher::new(source, clock.clone()),
            publisher: DestinationPublisher::new(api),
            sink,
            clock,
        }
    }

    /// Runs one full cycle against `state`.
    pub async fn run_cycle(&self, state: &mut SyncState) -> CycleReport {
        let started_at = self.clock.now();

        if state.entities.is_empty() {
            warn!("No tracked entities, skipping sync cycle");
            return CycleReport::new(CycleOutcome::Skipped, state.checkpoint, started_at);
        }

        debug!(phase = ?CyclePhase::Fetching, checkpoint = %state.checkpoint, "Sync cycle");
        let batch = self
            .fetcher
            .fetch_for_all(&state.entities, &state.checkpoint)
            .await;
        let fetched = batch.total_records();

        if batch.is_empty() {
            info!(checkpoint = %state.checkpoint, "No new gists since last sync");
            let mut report = CycleReport::new(CycleOutcome::Empty, state.checkpoint, started_at);
            report.fetched = fetched;
            return report;
        }

        debug!(phase = ?CyclePhase::Transforming, fetched, "Sync cycle");
        let activities = transform(&batch);

        if let Err(e) = self.sink.persist(&batch).await {
            warn!(error = %e, "Failed to persist fetched payload");
        }

        debug!(phase = ?CyclePhase::Publishing, count = activities.len(), "Sync cycle");
        let outcomes = self.publisher.publish(&activities).await;

        let outcome = if outcomes.is_empty() {
            warn!(
                checkpoint = %state.checkpoint,
                attempted = activities.len(),
                "No activities created, checkpoint not advanced"
            );
            CycleOutcome::Stalled
        } else {
            state.advance(self.clock.now());
            info!(
                published = outcomes.len(),
                attempted = activities.len(),
                checkpoint = %state.checkpoint,
                "Sync cycle complete"
            );
            CycleOutcome::Advanced
        };

        debug!(phase = ?CyclePhase::Idle, "Sync cycle");
        CycleReport {
            outcome,
            fetched,
            transformed: activities.len(),
            published: outcomes.len(),
            checkpoint: state.checkpoint,
            started_at,
        }
    }

    /// On-demand fetch for one tracked entity.
    ///
    /// `Ok(None)` is the failure marker: the source call failed and the
    /// entity's `last_visit` is unchanged. Untracked names are an error.
    pub async fn fetch_entity(
        &self,
        state: &mut SyncState,
        name: &str,
    ) -> SyncResult<Option<Vec<Gist>>> {
        let entity = state.entity_mut(name)?;
        Ok(self.fetcher.fetch_for_one(entity).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::sink::DiscardSink;
    use crate::test_support::{ts, CapturedLogs, FakeApi, FakeSource};
    use gistpipe_core::{CoreError, FixedClock, TrackedEntities};
    use serde_json::json;
    use std::sync::Mutex;

    fn orchestrator(source: Arc<FakeSource>, api: Arc<FakeApi>, now: u32) -> SyncOrchestrator {
        SyncOrchestrator::new(
            source,
            api,
            Arc::new(DiscardSink),
            Arc::new(FixedClock(ts(now))),
        )
    }

    fn state(names: &[&str]) -> SyncState {
        SyncState::new(TrackedEntities::from_names(names.iter().copied()).unwrap())
    }

    #[tokio::test]
    async fn test_single_gist_scenario() {
        let source = Arc::new(FakeSource::new().with_gists("a", &["g1"]));
        let api = Arc::new(FakeApi::new());
        let mut state = state(&["a"]);

        let report = orchestrator(source.clone(), api.clone(), 12)
            .run_cycle(&mut state)
            .await;

        assert_eq!(source.calls(), vec![("a".to_string(), None)]);
        assert_eq!(
            serde_json::to_value(&api.calls()[0]).unwrap(),
            json!({ "subject": "g1", "note": "http://x/g1; Owner: a", "type": "Task", "done": 0 })
        );
        assert_eq!(report.outcome, CycleOutcome::Advanced);
        assert_eq!((report.fetched, report.transformed, report.published), (1, 1, 1));
        assert_eq!(state.checkpoint, Checkpoint::At(ts(12)));
        assert_eq!(report.checkpoint, state.checkpoint);
    }

    #[tokio::test]
    async fn test_checkpoint_moves_forward_on_success() {
        let source = Arc::new(FakeSource::new().with_gists("a", &["g1"]));
        let api = Arc::new(FakeApi::new());
        let mut state = state(&["a"]);

        orchestrator(source.clone(), api.clone(), 10).run_cycle(&mut state).await;
        orchestrator(source.clone(), api.clone(), 11).run_cycle(&mut state).await;

        assert_eq!(state.checkpoint, Checkpoint::At(ts(11)));
        assert_eq!(source.calls()[1].1.as_deref(), Some("2024-05-01T10:00:00Z"));
    }

    #[tokio::test]
    async fn test_empty_batch_keeps_checkpoint() {
        let source = Arc::new(FakeSource::new().failing("b"));
        let api = Arc::new(FakeApi::new());
        let mut state = state(&["a", "b"]).with_checkpoint(Checkpoint::At(ts(3)));

        let report = orchestrator(source, api.clone(), 12).run_cycle(&mut state).await;

        assert_eq!(report.outcome, CycleOutcome::Empty);
        assert_eq!(state.checkpoint, Checkpoint::At(ts(3)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_all_rejected_stalls() {
        let source = Arc::new(FakeSource::new().with_gists("a", &["g1", "g2"]));
        let api = Arc::new(FakeApi::new().rejecting(&["g1", "g2"]));
        let mut state = state(&["a"]);
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let report = orchestrator(source, api.clone(), 12).run_cycle(&mut state).await;

        assert_eq!(report.outcome, CycleOutcome::Stalled);
        assert_eq!((report.transformed, report.published), (2, 0));
        assert!(state.checkpoint.is_never());
        assert_eq!(api.calls().len(), 2);

        let warnings = logs.warnings();
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].contains("checkpoint not advanced"));
        assert!(warnings[0].contains("checkpoint=never"));
    }

    #[tokio::test]
    async fn test_stall_warning_reports_current_checkpoint() {
        let source = Arc::new(FakeSource::new().with_gists("a", &["g1"]));
        let api = Arc::new(FakeApi::new().rejecting(&["g1"]));
        let mut state = state(&["a"]).with_checkpoint(Checkpoint::At(ts(9)));
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        orchestrator(source, api, 12).run_cycle(&mut state).await;

        let warnings = logs.warnings();
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].contains("checkpoint=2024-05-01T09:00:00Z"));
    }

    #[tokio::test]
    async fn test_partial_entity_failure() {
        let source = Arc::new(
            FakeSource::new()
                .with_gists("a", &["a1"])
                .failing("b")
                .with_gists("c", &["c1", "c2"]),
        );
        let api = Arc::new(FakeApi::new());
        let mut state = state(&["a", "b", "c"]);

        let report = orchestrator(source, api.clone(), 12).run_cycle(&mut state).await;

        let subjects: Vec<String> = api.calls().into_iter().map(|a| a.subject).collect();
        assert_eq!(subjects, vec!["a1", "c1", "c2"]);
        assert_eq!(report.outcome, CycleOutcome::Advanced);
        assert_eq!(state.checkpoint, Checkpoint::At(ts(12)));
    }

    #[tokio::test]
    async fn test_no_entities_makes_no_calls() {
        let source = Arc::new(FakeSource::new());
        let api = Arc::new(FakeApi::new());
        let mut state = SyncState::default();
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let report = orchestrator(source.clone(), api.clone(), 12)
            .run_cycle(&mut state)
            .await;

        assert_eq!(report.outcome, CycleOutcome::Skipped);
        assert!(source.calls().is_empty());
        assert!(api.calls().is_empty());
        assert!(state.checkpoint.is_never());

        let warnings = logs.warnings();
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].contains("No tracked entities"));
    }

    struct FailingSink(Mutex<usize>);

    #[async_trait::async_trait]
    impl PayloadSink for FailingSink {
        async fn persist(&self, _batch: &gistpipe_core::SourceBatch) -> SyncResult<()> {
            *self.0.lock().unwrap() += 1;
            Err(SyncError::PersistFailed("disk full".into()))
        }
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_stop_cycle() {
        let sink = Arc::new(FailingSink(Mutex::new(0)));
        let orchestrator = SyncOrchestrator::new(
            Arc::new(FakeSource::new().with_gists("a", &["g1"])),
            Arc::new(FakeApi::new()),
            sink.clone(),
            Arc::new(FixedClock(ts(12))),
        );
        let mut state = state(&["a"]);

        let report = orchestrator.run_cycle(&mut state).await;

        assert_eq!(*sink.0.lock().unwrap(), 1);
        assert!(report.outcome.advanced());
    }

    #[tokio::test]
    async fn test_fetch_entity() {
        let source = Arc::new(FakeSource::new().with_gists("a", &["g1"]).failing("b"));
        let orchestrator = orchestrator(source, Arc::new(FakeApi::new()), 12);
        let mut state = state(&["a", "b"]);

        let gists = orchestrator.fetch_entity(&mut state, "a").await.unwrap();
        assert_eq!(gists.unwrap()[0].id, "g1");
        assert_eq!(state.entities.get("a").unwrap().last_visit, Some(ts(12)));

        assert!(orchestrator.fetch_entity(&mut state, "b").await.unwrap().is_none());
        assert!(state.entities.get("b").unwrap().last_visit.is_none());

        assert!(matches!(
            orchestrator.fetch_entity(&mut state, "zed").await,
            Err(SyncError::Domain(CoreError::EntityNotTracked(_)))
        ));
        assert!(state.checkpoint.is_never());
    }
}
