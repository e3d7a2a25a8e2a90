//! Custom error types for the common library
//!
//! Every store operation in the workspace reports failures through
//! [`DatabaseError`]. The HTTP layer maps each variant onto an error envelope.

use mongodb::bson;
use thiserror::Error;

/// Custom error type for document store operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// A path or query value was not a valid object id
    #[error("Invalid {field}: {value}")]
    InvalidId { field: String, value: String },

    /// The addressed document does not exist
    #[error("{0}")]
    NotFound(String),

    /// The request was well formed but cannot be applied
    #[error("{0}")]
    Validation(String),

    /// The operation did not finish within its time budget
    #[error("{0} timed out")]
    Timeout(&'static str),

    /// Error occurred during connection setup
    #[error("Database connection error: {0}")]
    Connection(#[source] mongodb::error::Error),

    /// Error reported by the driver while executing an operation
    #[error("Database query error: {0}")]
    Query(#[source] mongodb::error::Error),

    /// A value could not be converted to BSON
    #[error("Failed to encode document: {0}")]
    Encode(#[from] bson::ser::Error),

    /// A stored document did not match the expected shape
    #[error("Failed to decode document: {0}")]
    Decode(#[from] bson::de::Error),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    pub fn invalid_id(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidId {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True when the failure was caused by caller input rather than the store
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidId { .. } | Self::Validation(_))
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
