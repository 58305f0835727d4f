//! Error types for the soft-delete layer
//!
//! The scope itself adds no error boundary: everything here is raised by the
//! executor, by attribute (de)serialization or by timestamp parsing, and is
//! propagated to the caller unchanged.

use thiserror::Error;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for model and query operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(String),

    /// Model not found in database
    #[error("Record not found in table '{0}'")]
    NotFound(String),

    /// Attribute validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Primary key is missing or invalid
    #[error("Primary key is missing or invalid")]
    MissingPrimaryKey,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Query building error
    #[error("Query error: {0}")]
    Query(String),

    /// An insert collided with an existing row on a unique key
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
}

// SQLSTATE for unique_violation
const PG_UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) {
                return ModelError::UniqueViolation(db_err.message().to_string());
            }
        }
        ModelError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}
