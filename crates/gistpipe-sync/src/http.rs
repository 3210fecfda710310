//! Shared HTTP plumbing for the GitHub and Pipedrive clients.

use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

use crate::config::HttpSettings;
use crate::error::SyncResult;

/// Builds the client both API wrappers share.
pub fn build_client(settings: &HttpSettings) -> SyncResult<Client> {
    let client = Client::builder()
        .timeout(settings.request_timeout())
        .user_agent(settings.user_agent.clone())
        .build()?;
    Ok(client)
}

/// Joins `path` onto a base URL, keeping any path prefix the base carries.
pub(crate) fn endpoint(base: &str, path: &str) -> SyncResult<Url> {
    let mut base = base.trim_end_matches('/').to_string();
    base.push('/');
    Ok(Url::parse(&base)?.join(path.trim_start_matches('/'))?)
}

/// Extracts the server's explanation from an error response.
///
/// Looks for `field` in a JSON body, falls back to the raw body, then to the
/// canonical status reason.
pub(crate) async fn read_error_message(response: Response, field: &str) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if let Ok(json) = serde_json::from_str::<Value>(&body) {
        if let Some(message) = json.get(field).and_then(Value::as_str) {
            return message.to_string();
        }
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}
