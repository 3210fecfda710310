//! # Sync Error Types
//!
//! Error types for sync operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Per item      │  │     Protocol            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Fetch          │  │  SerializationFailed    │ │
//! │  │  MissingConfig  │  │  Publish        │  │  DeserializationFailed  │ │
//! │  │  InvalidUrl     │  │  Transport      │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Configuration errors are fatal at startup.                            │
//! │  Per-item errors are caught per entity / per activity and logged;      │
//! │  they never abort a batch.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use gistpipe_core::CoreError;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required setting (credential, URL) is absent.
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// A base URL does not parse or is not http(s).
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Per-item Errors
    // =========================================================================
    /// Source answered a gist listing with a non-200 status.
    #[error("Fetching gists for {entity} failed with status {status}: {message}")]
    Fetch {
        entity: String,
        status: u16,
        message: String,
    },

    /// Destination answered an activity creation with a non-201 status.
    #[error("Creating activity {subject} failed with status {status}: {message}")]
    Publish {
        subject: String,
        status: u16,
        message: String,
    },

    /// The request never produced a response (DNS, connect, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(String),

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// Failed to serialize a body or payload.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// A response body did not have the expected shape.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    // =========================================================================
    // Persistence / Domain / Internal
    // =========================================================================
    /// Writing a fetched payload to disk failed.
    #[error("Failed to persist payload: {0}")]
    PersistFailed(String),

    /// Domain rule violated (bad entity name, untracked entity).
    #[error("Domain error: {0}")]
    Domain(#[from] CoreError),

    /// Scheduler is shutting down.
    #[error("Sync scheduler is shutting down")]
    ShuttingDown,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::DeserializationFailed(err.to_string())
        } else {
            SyncError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::PersistFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if this error indicates a configuration problem.
    ///
    /// These are the only errors that stop the process.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::MissingConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
        ) || matches!(self, SyncError::Domain(CoreError::Validation(_)))
    }

    /// Returns true if this error belongs to a single entity or activity and
    /// must be absorbed at that granularity.
    pub fn is_item_error(&self) -> bool {
        matches!(
            self,
            SyncError::Fetch { .. }
                | SyncError::Publish { .. }
                | SyncError::Transport(_)
                | SyncError::DeserializationFailed(_)
        )
    }

    /// HTTP status reported by the remote side, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Fetch { status, .. } | SyncError::Publish { status, .. } => Some(*status),
            _ => None,
        }
    }
}
