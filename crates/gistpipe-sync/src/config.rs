//! # Sync Configuration
//!
//! Configuration management for the sync engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GISTPIPE_SOURCE_TOKEN=ghp_...                                      │
//! │     GISTPIPE_ENTITIES=octocat,defunkt                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path> / GISTPIPE_CONFIG, or                              │
//! │     ~/.config/gistpipe/gistpipe.toml (Linux)                           │
//! │     ~/Library/Application Support/dev.gistpipe.gistpipe/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Public API base URLs, hourly schedule, no credentials              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [source]
//! base_url = "https://api.github.com"
//! token = "ghp_..."
//!
//! [destination]
//! base_url = "https://api.pipedrive.com"
//! api_token = "..."
//!
//! [schedule]
//! interval_secs = 3600
//! run_on_start = true
//!
//! [storage]
//! payload_dir = "data"
//!
//! [server]
//! port = 8080
//!
//! [[entities]]
//! name = "octocat"
//! ```
//!
//! Both credentials are required. A config that fails [`GistpipeConfig::validate`]
//! is the one condition that stops the daemon before any sync runs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use gistpipe_core::{SyncState, TrackedEntities};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Source / Destination
// =============================================================================

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_source_url")]
    pub base_url: String,

    /// Personal access token, sent as `Authorization: token <token>`.
    #[serde(default)]
    pub token: String,
}

fn default_source_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for SourceSettings {
    fn default() -> Self {
        SourceSettings {
            base_url: default_source_url(),
            token: String::new(),
        }
    }
}

/// Pipedrive API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationSettings {
    #[serde(default = "default_destination_url")]
    pub base_url: String,

    /// Sent as the `api_token` query parameter.
    #[serde(default)]
    pub api_token: String,
}

fn default_destination_url() -> String {
    "https://api.pipedrive.com".to_string()
}

impl Default for DestinationSettings {
    fn default() -> Self {
        DestinationSettings {
            base_url: default_destination_url(),
            api_token: String::new(),
        }
    }
}

// =============================================================================
// Schedule
// =============================================================================

/// When scheduled cycles run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSettings {
    /// Seconds between cycles.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Run one cycle as soon as the scheduler starts.
    #[serde(default = "default_true")]
    pub run_on_start: bool,
}

fn default_interval() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        ScheduleSettings {
            interval_secs: default_interval(),
            run_on_start: true,
        }
    }
}

impl ScheduleSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

// =============================================================================
// Storage / Server / HTTP
// =============================================================================

/// Where fetched payloads are written. `None` disables persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub payload_dir: Option<PathBuf>,
}

/// On-demand lookup server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            enabled: true,
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Shared HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// GitHub rejects requests without a User-Agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("gistpipe/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// One tracked GitHub account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySettings {
    pub name: String,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete gistpipe configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GistpipeConfig {
    #[serde(default)]
    pub source: SourceSettings,

    #[serde(default)]
    pub destination: DestinationSettings,

    #[serde(default)]
    pub schedule: ScheduleSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub http: HttpSettings,

    /// Tracked accounts, in sync order.
    #[serde(default)]
    pub entities: Vec<EntitySettings>,
}

impl GistpipeConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (an explicit path must exist; the default path may not)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                path => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML config file.
    pub fn from_file(path: &Path) -> SyncResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SyncError::ConfigLoadFailed(format!("{}: {}", path.display(), e)))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        validate_base_url("source.base_url", &self.source.base_url)?;
        validate_base_url("destination.base_url", &self.destination.base_url)?;

        if self.source.token.trim().is_empty() {
            return Err(SyncError::MissingConfig("source.token".into()));
        }

        if self.destination.api_token.trim().is_empty() {
            return Err(SyncError::MissingConfig("destination.api_token".into()));
        }

        if self.schedule.interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "schedule.interval_secs must be greater than 0".into(),
            ));
        }

        if self.http.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "http.request_timeout_secs must be greater than 0".into(),
            ));
        }

        self.tracked_entities()?;

        if self.entities.is_empty() {
            warn!("No entities configured; scheduled cycles will be skipped");
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GISTPIPE_SOURCE_URL") {
            debug!(url = %url, "Overriding source URL from environment");
            self.source.base_url = url;
        }

        if let Some(token) = lookup("GISTPIPE_SOURCE_TOKEN") {
            self.source.token = token;
        }

        if let Some(url) = lookup("GISTPIPE_DEST_URL") {
            debug!(url = %url, "Overriding destination URL from environment");
            self.destination.base_url = url;
        }

        if let Some(token) = lookup("GISTPIPE_DEST_TOKEN") {
            self.destination.api_token = token;
        }

        if let Some(interval) = lookup("GISTPIPE_INTERVAL_SECS") {
            match interval.parse::<u64>() {
                Ok(secs) => self.schedule.interval_secs = secs,
                Err(_) => warn!(value = %interval, "Ignoring non-numeric GISTPIPE_INTERVAL_SECS"),
            }
        }

        if let Some(dir) = lookup("GISTPIPE_PAYLOAD_DIR") {
            self.storage.payload_dir = Some(PathBuf::from(dir));
        }

        if let Some(port) = lookup("GISTPIPE_SERVER_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    debug!(port = p, "Overriding server port from environment");
                    self.server.port = p;
                }
                Err(_) => warn!(value = %port, "Ignoring invalid GISTPIPE_SERVER_PORT"),
            }
        }

        if let Some(names) = lookup("GISTPIPE_ENTITIES") {
            self.entities = names
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(|n| EntitySettings { name: n.to_string() })
                .collect();
            debug!(count = self.entities.len(), "Overriding entities from environment");
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "gistpipe", "gistpipe")
            .map(|dirs| dirs.config_dir().join("gistpipe.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Builds the validated, ordered entity list.
    pub fn tracked_entities(&self) -> SyncResult<TrackedEntities> {
        Ok(TrackedEntities::from_names(
            self.entities.iter().map(|e| e.name.clone()),
        )?)
    }

    /// State at process start: checkpoint `never`, no entity visited.
    pub fn initial_state(&self) -> SyncResult<SyncState> {
        Ok(SyncState::new(self.tracked_entities()?))
    }
}

fn validate_base_url(field: &str, value: &str) -> SyncResult<()> {
    if value.trim().is_empty() {
        return Err(SyncError::MissingConfig(field.to_string()));
    }

    let url = Url::parse(value)?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(SyncError::InvalidUrl(format!(
            "{} must start with http:// or https://, got: {}",
            field, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn valid_config() -> GistpipeConfig {
        GistpipeConfig {
            source: SourceSettings {
                token: "gh-token".into(),
                ..Default::default()
            },
            destination: DestinationSettings {
                api_token: "pd-token".into(),
                ..Default::default()
            },
            entities: vec![EntitySettings { name: "octocat".into() }],
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = GistpipeConfig::default();
        assert_eq!(config.source.base_url, "https://api.github.com");
        assert_eq!(config.destination.base_url, "https://api.pipedrive.com");
        assert_eq!(config.schedule.interval_secs, 3600);
        assert!(config.schedule.run_on_start);
        assert!(config.storage.payload_dir.is_none());
        assert_eq!(config.server.bind_address(), "127.0.0.1:8080");
        assert!(config.http.user_agent.starts_with("gistpipe/"));
    }

    #[test]
    fn test_missing_credentials_are_fatal() {
        let config = GistpipeConfig::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SyncError::MissingConfig(ref f) if f == "source.token"));
        assert!(err.is_config_error());

        let mut config = valid_config();
        config.destination.api_token = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(SyncError::MissingConfig(ref f)) if f == "destination.api_token"
        ));
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid_config();
        assert!(config.validate().is_ok());

        config.source.base_url = "ws://github".into();
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.source.base_url = "not a url".into();
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        let mut config = valid_config();
        config.schedule.interval_secs = 0;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));

        let mut config = valid_config();
        config.entities.push(EntitySettings { name: "octocat".into() });
        assert!(config.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GISTPIPE_SOURCE_TOKEN", "from-env"),
            ("GISTPIPE_DEST_URL", "http://127.0.0.1:9000"),
            ("GISTPIPE_INTERVAL_SECS", "60"),
            ("GISTPIPE_SERVER_PORT", "not-a-port"),
            ("GISTPIPE_ENTITIES", "amy, bob,,zed"),
        ]
        .into_iter()
        .collect();

        let mut config = valid_config();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.source.token, "from-env");
        assert_eq!(config.destination.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.schedule.interval_secs, 60);
        assert_eq!(config.server.port, 8080);

        let names: Vec<&str> = config.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["amy", "bob", "zed"]);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[source]
token = "gh"

[destination]
base_url = "http://localhost:9999"
api_token = "pd"

[schedule]
interval_secs = 120
run_on_start = false

[storage]
payload_dir = "data"

[[entities]]
name = "zed"

[[entities]]
name = "amy"
"#
        )
        .unwrap();

        let config = GistpipeConfig::from_file(file.path()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.source.base_url, "https://api.github.com");
        assert_eq!(config.schedule.interval(), Duration::from_secs(120));
        assert!(!config.schedule.run_on_start);
        assert_eq!(config.storage.payload_dir, Some(PathBuf::from("data")));

        let state = config.initial_state().unwrap();
        assert!(state.checkpoint.is_never());
        let names: Vec<&str> = state.entities.names().collect();
        assert_eq!(names, vec!["zed", "amy"]);
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let err = GistpipeConfig::from_file(Path::new("/nonexistent/gistpipe.toml")).unwrap_err();
        assert!(matches!(err, SyncError::ConfigLoadFailed(_)));
    }

    #[test]
    fn test_malformed_toml_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[source\ntoken = ").unwrap();
        assert!(matches!(
            GistpipeConfig::from_file(file.path()),
            Err(SyncError::ConfigLoadFailed(_))
        ));
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&valid_config()).unwrap();
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[[entities]]"));
    }
}
