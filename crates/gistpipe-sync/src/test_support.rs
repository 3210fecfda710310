//! In-memory fakes and an in-process HTTP server for unit tests.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use gistpipe_core::{Activity, Gist, PublishOutcome};

use crate::destination::ActivityApi;
use crate::error::{SyncError, SyncResult};
use crate::source::GistSource;

pub fn ts(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, h, 0, 0).unwrap()
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

// =============================================================================
// Captured logs
// =============================================================================

/// In-memory log sink for a scoped fmt subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Installs a WARN-and-above subscriber on the current thread until the
    /// guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.contains(" WARN "))
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Fake source
// =============================================================================

#[derive(Default)]
pub struct FakeSource {
    gists: HashMap<String, Vec<Gist>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gists(mut self, user: &str, ids: &[&str]) -> Self {
        let gists = ids
            .iter()
            .map(|id| Gist::new(*id, format!("http://x/{}", id), user))
            .collect();
        self.gists.insert(user.to_string(), gists);
        self
    }

    pub fn failing(mut self, user: &str) -> Self {
        self.failing.insert(user.to_string());
        self
    }

    /// `(user, since)` for every call, in order.
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GistSource for FakeSource {
    async fn list_gists(&self, user: &str, since: Option<&str>) -> SyncResult<Vec<Gist>> {
        self.calls
            .lock()
            .unwrap()
            .push((user.to_string(), since.map(str::to_string)));

        if self.failing.contains(user) {
            return Err(SyncError::Fetch {
                entity: user.to_string(),
                status: 404,
                message: "Not Found".to_string(),
            });
        }

        Ok(self.gists.get(user).cloned().unwrap_or_default())
    }
}

// =============================================================================
// Fake destination
// =============================================================================

pub struct FakeApi {
    rejected: HashSet<String>,
    next_id: Mutex<u64>,
    calls: Mutex<Vec<Activity>>,
}

impl FakeApi {
    /// Accepts everything, assigning ids from 42 upwards.
    pub fn new() -> Self {
        FakeApi {
            rejected: HashSet::new(),
            next_id: Mutex::new(42),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(mut self, subjects: &[&str]) -> Self {
        self.rejected.extend(subjects.iter().map(|s| s.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Activity> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivityApi for FakeApi {
    async fn create_activity(&self, activity: &Activity) -> SyncResult<PublishOutcome> {
        self.calls.lock().unwrap().push(activity.clone());

        if self.rejected.contains(&activity.subject) {
            return Err(SyncError::Publish {
                subject: activity.subject.clone(),
                status: 400,
                message: "rejected".to_string(),
            });
        }

        let mut next = self.next_id.lock().unwrap();
        let id = *next;
        *next += 1;

        Ok(PublishOutcome {
            id,
            subject: activity.subject.clone(),
            success: true,
        })
    }
}
