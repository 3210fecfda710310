//! # Checkpoint & Sync State
//!
//! The sync watermark and the state holder every cycle reads and updates.
//!
//! ## Checkpoint Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkpoint Transitions                           │
//! │                                                                         │
//! │   process start                                                         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ┌─────────┐   cycle published ≥1 activity   ┌──────────────────┐     │
//! │   │  Never  │ ──────────────────────────────► │  At(cycle time)  │     │
//! │   └─────────┘                                 └────────┬─────────┘     │
//! │        │                                         ▲     │                │
//! │        │ empty / stalled cycle                   │     │ published ≥1   │
//! │        ▼                                         │     ▼                │
//! │     (unchanged)                                  └─────┘                │
//! │                                                                         │
//! │  Wire form: "never" or RFC 3339 with second precision, e.g.            │
//! │  "2024-05-01T12:00:00Z" (the same string sent as `since=`)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here synchronizes access. [`SyncState`] is handed to a cycle as
//! `&mut`; the host decides how concurrent triggers are serialized.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, CoreResult};
use crate::types::{TrackedEntities, TrackedEntity};

const NEVER: &str = "never";

// =============================================================================
// Checkpoint
// =============================================================================

/// Watermark of the last sync that published something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Checkpoint {
    /// No cycle has published anything yet.
    #[default]
    Never,

    /// Wall-clock time of the last advancing cycle.
    At(DateTime<Utc>),
}

impl Checkpoint {
    pub fn is_never(&self) -> bool {
        matches!(self, Checkpoint::Never)
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Checkpoint::Never => None,
            Checkpoint::At(ts) => Some(*ts),
        }
    }

    /// Value for the source's `since` query parameter, if any.
    pub fn since(&self) -> Option<String> {
        self.timestamp()
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl From<Option<DateTime<Utc>>> for Checkpoint {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Checkpoint::Never, Checkpoint::At)
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.since() {
            Some(ts) => f.write_str(&ts),
            None => f.write_str(NEVER),
        }
    }
}

impl FromStr for Checkpoint {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(NEVER) {
            return Ok(Checkpoint::Never);
        }

        DateTime::parse_from_rfc3339(s)
            .map(|ts| Checkpoint::At(ts.with_timezone(&Utc)))
            .map_err(|e| CoreError::InvalidCheckpoint {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Serialize for Checkpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Checkpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Source of "now" for checkpoint and last-visit updates.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// =============================================================================
// Sync State
// =============================================================================

/// Single authoritative sync state: the global checkpoint plus the tracked
/// entities with their own last-visit marks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub checkpoint: Checkpoint,
    pub entities: TrackedEntities,
}

impl SyncState {
    /// Fresh state: checkpoint `Never`, no entity visited.
    pub fn new(entities: TrackedEntities) -> Self {
        SyncState {
            checkpoint: Checkpoint::Never,
            entities,
        }
    }

    pub fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    /// Moves the checkpoint to `now`.
    pub fn advance(&mut self, now: DateTime<Utc>) {
        self.checkpoint = Checkpoint::At(now);
    }

    /// Looks up a tracked entity for an on-demand fetch.
    pub fn entity_mut(&mut self, name: &str) -> CoreResult<&mut TrackedEntity> {
        self.entities
            .get_mut(name)
            .ok_or_else(|| CoreError::EntityNotTracked(name.to_string()))
    }
}
