//! # Payload Sink
//!
//! Where a cycle's raw batch goes before it is transformed. The write is a
//! side effect only: nothing ever reads the files back, and a failed write
//! never changes the outcome of a cycle.
//!
//! ```text
//! payload_dir/
//! ├── gists-20240501T120000.000Z.json
//! ├── gists-20240501T120000.000Z-1.json   (second cycle, same instant)
//! └── gists-20240501T130000.250Z.json
//! ```
//!
//! Files are created with `create_new`, so an existing payload is never
//! overwritten.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use gistpipe_core::{Clock, SourceBatch};

use crate::error::{SyncError, SyncResult};

/// Upper bound on `-N` suffixes tried for one timestamp.
const MAX_NAME_ATTEMPTS: u32 = 1000;

#[async_trait]
pub trait PayloadSink: Send + Sync {
    /// Stores the raw batch fetched by one cycle.
    async fn persist(&self, batch: &SourceBatch) -> SyncResult<()>;
}

/// Writes each batch as a pretty-printed JSON file.
pub struct FilePayloadSink {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FilePayloadSink {
    pub fn new(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        FilePayloadSink {
            dir: dir.into(),
            clock,
        }
    }

    fn file_name(stamp: &str, attempt: u32) -> String {
        match attempt {
            0 => format!("gists-{}.json", stamp),
            n => format!("gists-{}-{}.json", stamp, n),
        }
    }
}

#[async_trait]
impl PayloadSink for FilePayloadSink {
    async fn persist(&self, batch: &SourceBatch) -> SyncResult<()> {
        let body = serde_json::to_vec_pretty(batch)?;
        let stamp = self.clock.now().format("%Y%m%dT%H%M%S%.3fZ").to_string();

        tokio::fs::create_dir_all(&self.dir).await?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.dir.join(Self::file_name(&stamp, attempt));
            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            file.write_all(&body).await?;
            file.flush().await?;

            debug!(path = %path.display(), records = batch.total_records(), "Payload written");
            return Ok(());
        }

        Err(SyncError::PersistFailed(format!(
            "no free payload file name for {} in {}",
            stamp,
            self.dir.display()
        )))
    }
}

/// Drops every batch. Used when no payload directory is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

#[async_trait]
impl PayloadSink for DiscardSink {
    async fn persist(&self, _batch: &SourceBatch) -> SyncResult<()> {
        Ok(())
    }
}
