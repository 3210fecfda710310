//! # Gist Source
//!
//! Read side of the pipeline: lists a user's gists from the GitHub REST API.
//!
//! ```text
//! GET {base}/users/{name}/gists[?since=2024-05-01T12:00:00Z]
//!     Accept:        application/vnd.github+json
//!     Authorization: token <token>
//!     User-Agent:    gistpipe/<version>
//!
//! 200 → [ { id, html_url, owner: { login, .. }, .. }, .. ]
//! ≠200 → { "message": "Not Found", .. }
//! ```
//!
//! Only the first page is read.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use tracing::debug;

use gistpipe_core::Gist;

use crate::error::{SyncError, SyncResult};
use crate::http::{endpoint, read_error_message};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Anything that can list gists for a user.
#[async_trait]
pub trait GistSource: Send + Sync {
    /// Lists gists of `user`, optionally only those updated after `since`.
    async fn list_gists(&self, user: &str, since: Option<&str>) -> SyncResult<Vec<Gist>>;
}

/// GitHub REST client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GithubClient {
    pub fn new(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        GithubClient {
            client,
            base_url: base_url.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl GistSource for GithubClient {
    async fn list_gists(&self, user: &str, since: Option<&str>) -> SyncResult<Vec<Gist>> {
        let url = endpoint(&self.base_url, &format!("users/{}/gists", user))?;
        debug!(%url, ?since, "Listing gists");

        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(AUTHORIZATION, format!("token {}", self.token));
        if let Some(since) = since {
            request = request.query(&[("since", since)]);
        }

        let response = request.send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            return Err(SyncError::Fetch {
                entity: user.to_string(),
                status: status.as_u16(),
                message: read_error_message(response, "message").await,
            });
        }

        Ok(response.json::<Vec<Gist>>().await?)
    }
}
