//! # gistpipe-core: Pure Domain Logic for gistpipe
//!
//! This crate holds the data model of the GitHub → Pipedrive mirror and the
//! one piece of pure logic that sits in the middle of every sync cycle: the
//! gist → activity transform.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        gistpipe Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/daemon (gistpipe binary)                   │   │
//! │  │      Scheduler tick ──► run_cycle ◄── GET /users/{name}/gists   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 gistpipe-sync (async I/O)                       │   │
//! │  │   SourceFetcher ──► Transformer ──► DestinationPublisher        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ gistpipe-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ transform │  │ checkpoint │  │ validation│  │   │
//! │  │   │   Gist    │  │  Gist →   │  │ Checkpoint │  │  entity   │  │   │
//! │  │   │ Activity  │  │ Activity  │  │ SyncState  │  │   names   │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CLOCK READS • PURE FUNCTIONS         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Gist, Activity, PublishOutcome, tracked entities, batches
//! - [`transform`] - Gist → Activity mapping
//! - [`checkpoint`] - Sync watermark and the state holder passed to each cycle
//! - [`validation`] - Entity name rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use gistpipe_core::transform::transform;
//! use gistpipe_core::types::{EntityRecords, Gist, SourceBatch};
//!
//! let gist = Gist::new("g1", "http://x/g1", "a");
//! let batch = SourceBatch::from(vec![EntityRecords::new("a", vec![gist])]);
//!
//! let activities = transform(&batch);
//! assert_eq!(activities[0].subject, "g1");
//! assert_eq!(activities[0].note, "http://x/g1; Owner: a");
//! ```

pub mod checkpoint;
pub mod error;
pub mod transform;
pub mod types;
pub mod validation;

pub use checkpoint::{Checkpoint, Clock, FixedClock, SyncState};
pub use error::{CoreError, CoreResult, ValidationError};
pub use transform::{to_activity, transform};
pub use types::*;

/// Category written to every activity created in Pipedrive.
pub const ACTIVITY_TYPE: &str = "Task";

/// Separator between the gist URL and the owner login in an activity note.
pub const OWNER_SEPARATOR: &str = "; Owner: ";
