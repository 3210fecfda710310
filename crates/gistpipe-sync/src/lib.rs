//! # gistpipe-sync: Sync Engine for gistpipe
//!
//! This crate moves gists from GitHub into Pipedrive: it owns the HTTP
//! clients on both sides, the per-cycle orchestration and checkpoint policy,
//! the interval scheduler, and the configuration that wires them together.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Sync Engine Architecture                        │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                SyncScheduler (interval + trigger)                │  │
//! │  │                                                                  │  │
//! │  │  Spawned as a Tokio task by the daemon                          │  │
//! │  │  Locks the shared SyncState for each cycle                      │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      SyncOrchestrator                            │  │
//! │  │                                                                  │  │
//! │  │  fetch ──► transform ──► persist payload ──► publish ──► advance │  │
//! │  └──────┬──────────────────────────┬──────────────────────┬─────────┘  │
//! │         ▼                          ▼                      ▼             │
//! │  ┌────────────────┐  ┌────────────────────────┐  ┌────────────────┐    │
//! │  │ SourceFetcher  │  │     PayloadSink        │  │ Destination    │    │
//! │  │                │  │                        │  │ Publisher      │    │
//! │  │ GistSource     │  │ FilePayloadSink        │  │                │    │
//! │  │ └ GithubClient │  │ DiscardSink            │  │ ActivityApi    │    │
//! │  │                │  │                        │  │ └ Pipedrive    │    │
//! │  └────────────────┘  └────────────────────────┘  └────────────────┘    │
//! │                                                                         │
//! │  Per-entity and per-activity failures are logged and absorbed.         │
//! │  Only configuration errors surface to the caller.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Sync error types
//! - [`http`] - Shared reqwest client
//! - [`source`] - GitHub gist listing
//! - [`destination`] - Pipedrive activity creation
//! - [`fetcher`] - Per-entity fetching with failure isolation
//! - [`publisher`] - Sequential publishing
//! - [`sink`] - Raw payload persistence
//! - [`orchestrator`] - One sync cycle and the checkpoint rule
//! - [`scheduler`] - Interval / on-demand driver
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gistpipe_sync::{GistpipeConfig, SyncOrchestrator, SyncScheduler};
//!
//! let config = GistpipeConfig::load(None)?;
//! let state = Arc::new(Mutex::new(config.initial_state()?));
//!
//! let (scheduler, handle) = SyncScheduler::new(orchestrator, state, &config.schedule);
//! tokio::spawn(scheduler.run());
//!
//! handle.trigger()?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod destination;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod orchestrator;
pub mod publisher;
pub mod scheduler;
pub mod sink;
pub mod source;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{
    DestinationSettings, EntitySettings, GistpipeConfig, HttpSettings, ScheduleSettings,
    ServerSettings, SourceSettings, StorageSettings,
};
pub use destination::{ActivityApi, PipedriveClient};
pub use error::{SyncError, SyncResult};
pub use fetcher::SourceFetcher;
pub use http::build_client;
pub use orchestrator::{CycleOutcome, CyclePhase, CycleReport, SyncOrchestrator, SystemClock};
pub use publisher::DestinationPublisher;
pub use scheduler::{SchedulerHandle, SyncScheduler};
pub use sink::{DiscardSink, FilePayloadSink, PayloadSink};
pub use source::{GistSource, GithubClient};
