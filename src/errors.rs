//! Unified error type for the shipment registry.
//!
//! Every operation returns [`Result`]. Submission handlers catch whatever comes back
//! and show [`Error::user_message`] to the user; nothing is retried automatically.

use thiserror::Error;

/// Message shown when the `(bl_number, container_number, batch)` key already exists.
pub const DUPLICATE_SHIPMENT_MESSAGE: &str = "BL, container or batch already registered.";

/// Every failure the registry can report
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// A required field is missing or an input is malformed; raised before any network call
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending input field
        field: String,
        /// Text shown to the user
        message: String,
    },

    /// The persistence layer rejected a write because of a unique constraint
    #[error("Duplicate key: {message}")]
    DuplicateKey {
        /// Text shown to the user
        message: String,
    },

    /// A blob could not be written
    #[error("Upload of {path} failed: {message}")]
    Upload {
        /// Bucket-relative path that was being written
        path: String,
        /// Backend error text
        message: String,
    },

    /// Any other blob storage failure
    #[error("Storage error: {message}")]
    Storage {
        /// Backend error text
        message: String,
    },

    /// Record lookup by primary key came back empty
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record looked up
        entity: &'static str,
        /// Primary key that matched nothing
        id: i64,
    },

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Local filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] on `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Converts a database error, turning unique-constraint violations into
    /// [`Error::DuplicateKey`] carrying `duplicate_message`.
    pub fn from_write(err: sea_orm::DbErr, duplicate_message: &str) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!("Unique constraint violated: {}", detail);
                Self::DuplicateKey {
                    message: duplicate_message.to_string(),
                }
            }
            _ => Self::Database(err),
        }
    }

    /// The single message a form displays when its submission fails.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } | Self::DuplicateKey { message } => message.clone(),
            Self::Upload { message, .. } => format!("Could not upload document: {message}"),
            Self::NotFound { entity, .. } => format!("{entity} not found"),
            other => other.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_duplicate_key() {
        let err = Error::DuplicateKey {
            message: DUPLICATE_SHIPMENT_MESSAGE.to_string(),
        };
        assert_eq!(err.user_message(), DUPLICATE_SHIPMENT_MESSAGE);
    }

    #[test]
    fn test_user_message_for_validation_is_bare_message() {
        let err = Error::validation("bl_number", "BL is required");
        assert_eq!(err.user_message(), "BL is required");
        assert_eq!(err.to_string(), "Invalid bl_number: BL is required");
    }

    #[test]
    fn test_user_message_for_generic_backend_error_is_raw_text() {
        let err = Error::Database(sea_orm::DbErr::Custom("connection reset".to_string()));
        assert!(err.user_message().contains("connection reset"));
    }

    #[test]
    fn test_from_write_keeps_non_unique_errors() {
        let err = Error::from_write(
            sea_orm::DbErr::Custom("boom".to_string()),
            DUPLICATE_SHIPMENT_MESSAGE,
        );
        assert!(matches!(err, Error::Database(_)));
    }
}
