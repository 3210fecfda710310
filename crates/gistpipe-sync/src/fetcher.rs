//! # Source Fetcher
//!
//! Turns the tracked entity list into a [`SourceBatch`], one source call per
//! entity, strictly in list order.
//!
//! ## Failure Isolation
//! ```text
//! entities:  [ a ]──────►[ b ]──────►[ c ]
//!              │           │           │
//!              ▼           ▼ 404       ▼
//! batch:     a: [a1,a2]  b: []       c: [c1]
//!                          │
//!                          └── logged with the server message, not raised
//! ```
//!
//! Scheduled cycles pass the global checkpoint as `since`. The on-demand path
//! ([`SourceFetcher::fetch_for_one`]) uses the entity's own `last_visit`.

use std::sync::Arc;

use tracing::{error, info};

use gistpipe_core::{
    Checkpoint, Clock, EntityRecords, Gist, SourceBatch, TrackedEntities, TrackedEntity,
};

use crate::source::GistSource;

pub struct SourceFetcher {
    source: Arc<dyn GistSource>,
    clock: Arc<dyn Clock>,
}

impl SourceFetcher {
    pub fn new(source: Arc<dyn GistSource>, clock: Arc<dyn Clock>) -> Self {
        SourceFetcher { source, clock }
    }

    /// Fetches every entity since `checkpoint`.
    ///
    /// Always returns one slot per entity; failed entities get an empty one.
    pub async fn fetch_for_all(
        &self,
        entities: &TrackedEntities,
        checkpoint: &Checkpoint,
    ) -> SourceBatch {
        let since = checkpoint.since();
        let mut batch = SourceBatch::new();

        for entity in entities {
            let records = self
                .fetch(&entity.name, since.as_deref())
                .await
                .unwrap_or_default();
            batch.push(EntityRecords::new(entity.name.clone(), records));
        }

        batch
    }

    /// Fetches one entity since its own last visit.
    ///
    /// `None` marks a failed fetch; `last_visit` then stays untouched.
    pub async fn fetch_for_one(&self, entity: &mut TrackedEntity) -> Option<Vec<Gist>> {
        let started = self.clock.now();
        let since = Checkpoint::from(entity.last_visit).since();

        let records = self.fetch(&entity.name, since.as_deref()).await?;
        entity.last_visit = Some(started);
        Some(records)
    }

    async fn fetch(&self, entity: &str, since: Option<&str>) -> Option<Vec<Gist>> {
        match self.source.list_gists(entity, since).await {
            Ok(records) => {
                info!(entity, count = records.len(), "Fetched gists");
                Some(records)
            }
            Err(e) => {
                error!(entity, error = %e, "Failed to fetch gists");
                None
            }
        }
    }
}
