//! # Activity Destination
//!
//! Write side of the pipeline: creates activities through the Pipedrive API.
//!
//! ```text
//! POST {base}/v1/activities?api_token=<token>
//!      Content-Type: application/json
//!      { "subject": "g1", "note": "...", "type": "Task", "done": 0 }
//!
//! 201 → { "data": { "id": 42, "subject": "g1", .. }, "success": true }
//! ≠201 → { "success": false, "error": "..." }
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use gistpipe_core::{Activity, PublishOutcome};

use crate::error::{SyncError, SyncResult};
use crate::http::{endpoint, read_error_message};

/// Anything that can create one activity.
#[async_trait]
pub trait ActivityApi: Send + Sync {
    /// Submits one activity. `Ok` only when the destination accepted it.
    async fn create_activity(&self, activity: &Activity) -> SyncResult<PublishOutcome>;
}

#[derive(Debug, Deserialize)]
struct CreatedActivity {
    id: u64,
    subject: String,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    data: CreatedActivity,
    #[serde(default = "accepted")]
    success: bool,
}

fn accepted() -> bool {
    true
}

/// Pipedrive REST client.
#[derive(Debug, Clone)]
pub struct PipedriveClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl PipedriveClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        PipedriveClient {
            client,
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }
}

#[async_trait]
impl ActivityApi for PipedriveClient {
    async fn create_activity(&self, activity: &Activity) -> SyncResult<PublishOutcome> {
        let url = endpoint(&self.base_url, "v1/activities")?;
        debug!(%url, subject = %activity.subject, "Creating activity");

        let response = self
            .client
            .post(url)
            .query(&[("api_token", self.api_token.as_str())])
            .json(activity)
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(SyncError::Publish {
                subject: activity.subject.clone(),
                status: response.status().as_u16(),
                message: read_error_message(response, "error").await,
            });
        }

        let body: CreateResponse = response.json().await?;
        Ok(PublishOutcome {
            id: body.data.id,
            subject: body.data.subject,
            success: body.success,
        })
    }
}
