//! # Error Types
//!
//! Domain-specific error types for gistpipe-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gistpipe-core errors (this file)                                      │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  gistpipe-sync errors (separate crate)                                 │
//! │  └── SyncError        - Fetch, publish, config and transport failures  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → daemon exit / log     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transform itself has no failure mode: a gist that lacks an id, URL or
//! owner never deserializes, so it never reaches [`crate::transform`].

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A checkpoint string is neither `never` nor an RFC 3339 timestamp.
    #[error("Invalid checkpoint '{value}': {reason}")]
    InvalidCheckpoint { value: String, reason: String },

    /// The named entity is not in the tracked list.
    #[error("Entity not tracked: {0}")]
    EntityNotTracked(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised while building the tracked entity list from configuration, before
/// any sync cycle runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., the same user tracked twice).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
