//! # Domain Types
//!
//! Core domain types used throughout gistpipe.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  SOURCE SIDE (GitHub)              DESTINATION SIDE (Pipedrive)        │
//! │  ┌─────────────────┐               ┌─────────────────┐                 │
//! │  │      Gist       │  transform    │    Activity     │                 │
//! │  │  ─────────────  │ ────────────► │  ─────────────  │                 │
//! │  │  id             │               │  subject = id   │                 │
//! │  │  html_url       │               │  note           │                 │
//! │  │  owner.login    │               │  type = "Task"  │                 │
//! │  │  (extra fields) │               │  done = 0       │                 │
//! │  └─────────────────┘               └────────┬────────┘                 │
//! │                                             │ 201 Created              │
//! │  ┌─────────────────┐               ┌────────▼────────┐                 │
//! │  │  SourceBatch    │               │ PublishOutcome  │                 │
//! │  │  [EntityRecords]│               │  id, subject,   │                 │
//! │  │  one per entity │               │  success        │                 │
//! │  └─────────────────┘               └─────────────────┘                 │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │ TrackedEntities │  ordered, unique names, each with last_visit      │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::validate_entity_name;

// =============================================================================
// Gist (raw source record)
// =============================================================================

/// Owner block of a gist. Only `login` is read; the rest is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GistOwner {
    pub login: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A gist as returned by `GET /users/{name}/gists`.
///
/// `id`, `html_url` and `owner.login` are required; every other field the
/// source sends is preserved in `extra` so persisted payloads stay complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gist {
    pub id: String,

    pub html_url: String,

    pub owner: GistOwner,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Gist {
    /// Builds a gist carrying only the required fields.
    pub fn new(id: impl Into<String>, html_url: impl Into<String>, owner: impl Into<String>) -> Self {
        Gist {
            id: id.into(),
            html_url: html_url.into(),
            owner: GistOwner {
                login: owner.into(),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    /// Login of the gist owner.
    pub fn owner_login(&self) -> &str {
        &self.owner.login
    }
}

// =============================================================================
// Source Batch
// =============================================================================

/// Records fetched for one tracked entity during a cycle.
///
/// A failed fetch still contributes an `EntityRecords` with no records, so
/// the batch always has one slot per entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecords {
    pub entity: String,
    pub records: Vec<Gist>,
}

impl EntityRecords {
    pub fn new(entity: impl Into<String>, records: Vec<Gist>) -> Self {
        EntityRecords {
            entity: entity.into(),
            records,
        }
    }

    /// Slot for an entity whose fetch failed.
    pub fn empty(entity: impl Into<String>) -> Self {
        Self::new(entity, Vec::new())
    }
}

/// Everything fetched in one cycle, in entity iteration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceBatch {
    entries: Vec<EntityRecords>,
}

impl SourceBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, records: EntityRecords) {
        self.entries.push(records);
    }

    /// Per-entity slots, in fetch order.
    pub fn entries(&self) -> &[EntityRecords] {
        &self.entries
    }

    /// Total number of records across all entities.
    pub fn total_records(&self) -> usize {
        self.entries.iter().map(|e| e.records.len()).sum()
    }

    /// True when no entity produced a record (including when there are no
    /// slots at all).
    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }

    /// Flattens the two-level batch into entity-then-record order.
    pub fn flatten(&self) -> impl Iterator<Item = &Gist> + '_ {
        self.entries.iter().flat_map(|e| e.records.iter())
    }
}

impl From<Vec<EntityRecords>> for SourceBatch {
    fn from(entries: Vec<EntityRecords>) -> Self {
        SourceBatch { entries }
    }
}

// =============================================================================
// Activity (transformed record)
// =============================================================================

/// A Pipedrive activity derived from exactly one gist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// The gist id.
    pub subject: String,

    /// `"<html_url>; Owner: <login>"`.
    pub note: String,

    /// Always [`crate::ACTIVITY_TYPE`].
    #[serde(rename = "type")]
    pub activity_type: String,

    /// Always false for mirrored gists. Sent as `0`/`1`.
    #[serde(with = "done_flag")]
    pub done: bool,
}

/// Pipedrive encodes `done` as an integer.
mod done_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(done: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*done))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Int(u8),
        Bool(bool),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Flag::deserialize(deserializer)? {
            Flag::Int(n) => n != 0,
            Flag::Bool(b) => b,
        })
    }
}

// =============================================================================
// Publish Outcome
// =============================================================================

/// An activity the destination accepted.
///
/// Rejected submissions never produce one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOutcome {
    /// Pipedrive activity id.
    pub id: u64,

    pub subject: String,

    pub success: bool,
}

// =============================================================================
// Tracked Entities
// =============================================================================

/// A GitHub account whose gists are mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntity {
    /// GitHub login; unique within [`TrackedEntities`].
    pub name: String,

    /// When this entity was last fetched successfully through the on-demand
    /// path. `None` until then.
    #[serde(default)]
    pub last_visit: Option<DateTime<Utc>>,
}

impl TrackedEntity {
    pub fn new(name: impl Into<String>) -> Self {
        TrackedEntity {
            name: name.into(),
            last_visit: None,
        }
    }
}

/// Insertion-ordered list of tracked entities with unique, valid names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedEntities {
    entries: Vec<TrackedEntity>,
}

impl TrackedEntities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the list from names, rejecting invalid or repeated names.
    pub fn from_names<I, S>(names: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entities = Self::new();
        for name in names {
            entities.push(TrackedEntity::new(name))?;
        }
        Ok(entities)
    }

    /// Appends an entity, keeping names unique.
    pub fn push(&mut self, entity: TrackedEntity) -> CoreResult<()> {
        validate_entity_name(&entity.name)?;

        if self.contains(&entity.name) {
            return Err(CoreError::Validation(ValidationError::Duplicate {
                field: "entity name".to_string(),
                value: entity.name,
            }));
        }

        self.entries.push(entity);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&TrackedEntity> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TrackedEntity> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackedEntity> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.name.as_str())
    }
}

impl<'a> IntoIterator for &'a TrackedEntities {
    type Item = &'a TrackedEntity;
    type IntoIter = std::slice::Iter<'a, TrackedEntity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
