//! # Lookup Server
//!
//! JSON endpoints sharing the scheduler's sync state.
//!
//! ```text
//! GET  /users/{name}/gists   fetch one tracked user since its last visit
//!                            200 [gists] | 404 untracked | 502 fetch failed
//! GET  /status               { checkpoint, entities, last_cycle }
//! POST /sync                 202, runs a cycle on the scheduler
//! ```

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};

use gistpipe_core::{Checkpoint, CoreError, Gist, SyncState, TrackedEntities};
use gistpipe_sync::{CycleReport, SchedulerHandle, SyncError, SyncOrchestrator};

/// Shared application state.
pub struct AppState {
    pub orchestrator: Arc<SyncOrchestrator>,
    pub state: Arc<Mutex<SyncState>>,
    pub scheduler: SchedulerHandle,
}

/// Errors a handler can answer with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not tracked: {0}")]
    NotFound(String),

    #[error("Upstream fetch failed for {0}")]
    BadGateway(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SyncError> for ApiError {
    fn from(error: SyncError) -> Self {
        match error {
            SyncError::Domain(CoreError::EntityNotTracked(name)) => ApiError::NotFound(name),
            SyncError::ShuttingDown => ApiError::Unavailable(error.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
struct StatusBody {
    checkpoint: Checkpoint,
    entities: TrackedEntities,
    last_cycle: Option<CycleReport>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users/{name}/gists", get(user_gists))
        .route("/status", get(status))
        .route("/sync", post(trigger_sync))
        .with_state(state)
}

async fn user_gists(
    State(app): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Gist>>, ApiError> {
    let mut state = app.state.lock().await;

    match app.orchestrator.fetch_entity(&mut state, &name).await? {
        Some(gists) => {
            info!(entity = %name, count = gists.len(), "On-demand fetch served");
            Ok(Json(gists))
        }
        None => Err(ApiError::BadGateway(name)),
    }
}

async fn status(State(app): State<Arc<AppState>>) -> Json<StatusBody> {
    let (checkpoint, entities) = {
        let state = app.state.lock().await;
        (state.checkpoint, state.entities.clone())
    };

    Json(StatusBody {
        checkpoint,
        entities,
        last_cycle: app.scheduler.last_report().await,
    })
}

async fn trigger_sync(State(app): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    app.scheduler.trigger().map_err(|e| {
        warn!(error = %e, "Sync trigger rejected");
        ApiError::from(e)
    })?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))))
}
