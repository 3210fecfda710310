//! # Sync Scheduler
//!
//! Drives [`SyncOrchestrator::run_cycle`] on a fixed interval and on demand.
//!
//! ## Control Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SyncScheduler::run                             │
//! │                                                                         │
//! │   tokio::select! {                                                      │
//! │       interval.tick()     ──► lock state ──► run_cycle ──► last_report  │
//! │       trigger_rx.recv()   ──► (same)                                    │
//! │       shutdown_rx.recv()  ──► break                                     │
//! │   }                                                                     │
//! │                                                                         │
//! │  • Interval: schedule.interval_secs (default 1 hour)                   │
//! │  • Missed ticks are delayed, never bursted                             │
//! │  • Triggers coalesce: at most one pending                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The state mutex is the same one the lookup server takes, so a scheduled
//! cycle and an on-demand fetch never interleave.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use gistpipe_core::SyncState;

use crate::config::ScheduleSettings;
use crate::error::{SyncError, SyncResult};
use crate::orchestrator::{CycleReport, SyncOrchestrator};

pub struct SyncScheduler {
    orchestrator: Arc<SyncOrchestrator>,
    state: Arc<Mutex<SyncState>>,
    interval: Duration,
    run_on_start: bool,
    last_report: Arc<RwLock<Option<CycleReport>>>,

    /// Channel for on-demand cycles.
    trigger_rx: mpsc::Receiver<()>,

    /// Shutdown signal receiver.
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling the scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    trigger_tx: mpsc::Sender<()>,
    shutdown_tx: mpsc::Sender<()>,
    last_report: Arc<RwLock<Option<CycleReport>>>,
}

impl SchedulerHandle {
    /// Requests a cycle as soon as the current one (if any) finishes.
    pub fn trigger(&self) -> SyncResult<()> {
        match self.trigger_tx.try_send(()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(())) => {
                debug!("Sync already pending, trigger coalesced");
                Ok(())
            }
            Err(TrySendError::Closed(())) => Err(SyncError::ShuttingDown),
        }
    }

    /// Signals the scheduler to stop after the current cycle.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|e| SyncError::ChannelError(e.to_string()))
    }

    /// Report of the most recently finished cycle.
    pub async fn last_report(&self) -> Option<CycleReport> {
        self.last_report.read().await.clone()
    }
}

impl SyncScheduler {
    pub fn new(
        orchestrator: Arc<SyncOrchestrator>,
        state: Arc<Mutex<SyncState>>,
        settings: &ScheduleSettings,
    ) -> (Self, SchedulerHandle) {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let last_report = Arc::new(RwLock::new(None));

        let scheduler = SyncScheduler {
            orchestrator,
            state,
            interval: settings.interval(),
            run_on_start: settings.run_on_start,
            last_report: last_report.clone(),
            trigger_rx,
            shutdown_rx,
        };

        let handle = SchedulerHandle {
            trigger_tx,
            shutdown_tx,
            last_report,
        };

        (scheduler, handle)
    }

    /// Runs until [`SchedulerHandle::shutdown`] is called.
    pub async fn run(mut self) {
        info!(
            interval_secs = self.interval.as_secs(),
            run_on_start = self.run_on_start,
            "Sync scheduler starting"
        );

        let mut interval = if self.run_on_start {
            tokio::time::interval(self.interval)
        } else {
            tokio::time::interval_at(Instant::now() + self.interval, self.interval)
        };
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_once().await;
                }

                Some(()) = self.trigger_rx.recv() => {
                    info!("Sync triggered on demand");
                    self.run_once().await;
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Sync scheduler shutting down");
                    break;
                }
            }
        }

        info!("Sync scheduler stopped");
    }

    async fn run_once(&self) {
        let report = {
            let mut state = self.state.lock().await;
            self.orchestrator.run_cycle(&mut state).await
        };

        debug!(outcome = ?report.outcome, published = report.published, "Cycle finished");
        *self.last_report.write().await = Some(report);
    }
}
