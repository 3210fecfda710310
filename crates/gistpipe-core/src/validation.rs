//! # Validation Module
//!
//! Rules for the names of tracked GitHub accounts.
//!
//! Names come from configuration (TOML file or `GISTPIPE_ENTITIES`) and are
//! spliced into the source URL path, so they are checked once at startup
//! rather than trusted per request.
//!
//! ## Usage
//! ```rust
//! use gistpipe_core::validation::validate_entity_name;
//!
//! assert!(validate_entity_name("octocat").is_ok());
//! assert!(validate_entity_name("not/a/user").is_err());
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest login GitHub accepts.
pub const MAX_ENTITY_NAME_LEN: usize = 39;

/// Validates a tracked entity (GitHub login) name.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most 39 characters
/// - Only ASCII letters, digits and hyphens
/// - Must not start or end with a hyphen
pub fn validate_entity_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "entity name".to_string(),
        });
    }

    if name.len() > MAX_ENTITY_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "entity name".to_string(),
            max: MAX_ENTITY_NAME_LEN,
        });
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "entity name".to_string(),
            reason: format!("'{}' must contain only letters, numbers, and hyphens", name),
        });
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err(ValidationError::InvalidFormat {
            field: "entity name".to_string(),
            reason: format!("'{}' must not start or end with a hyphen", name),
        });
    }

    Ok(())
}
